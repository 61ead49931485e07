//! Request identifiers
//!
//! Wire values follow the platform vibrator interface. Decoding a raw value
//! that names no variant is an illegal argument.

use core::fmt;

use serde::{Deserialize, Serialize};
use vibrator_errors::HapticError;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident = $value:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(i32)]
        pub enum $name {
            $($variant = $value),+
        }

        impl $name {
            /// Every variant in wire order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire value.
            pub fn raw(self) -> i32 {
                self as i32
            }
        }

        impl TryFrom<i32> for $name {
            type Error = HapticError;

            fn try_from(raw: i32) -> Result<Self, Self::Error> {
                match raw {
                    $($value => Ok($name::$variant),)+
                    _ => Err(HapticError::IllegalArgument(format!(
                        "unknown {} value {raw}",
                        stringify!($name)
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

wire_enum! {
    /// Named one-shot effects.
    pub enum Effect {
        Click = 0,
        DoubleClick = 1,
        Tick = 2,
        Thud = 3,
        Pop = 4,
        HeavyClick = 5,
        Ringtone1 = 6,
        Ringtone2 = 7,
        Ringtone3 = 8,
        Ringtone4 = 9,
        Ringtone5 = 10,
        Ringtone6 = 11,
        Ringtone7 = 12,
        Ringtone8 = 13,
        Ringtone9 = 14,
        Ringtone10 = 15,
        Ringtone11 = 16,
        Ringtone12 = 17,
        Ringtone13 = 18,
        Ringtone14 = 19,
        Ringtone15 = 20,
        TextureTick = 21,
    }
}

wire_enum! {
    /// Strength tier of a named effect.
    pub enum EffectStrength {
        Light = 0,
        Medium = 1,
        Strong = 2,
    }
}

wire_enum! {
    /// Building blocks of a composed sequence.
    pub enum CompositePrimitive {
        Noop = 0,
        Click = 1,
        Thud = 2,
        Spin = 3,
        QuickRise = 4,
        SlowRise = 5,
        QuickFall = 6,
        LightTick = 7,
        LowTick = 8,
    }
}

wire_enum! {
    /// Braking applied at the end of a PWLE sequence.
    pub enum Braking {
        None = 0,
        Clab = 1,
    }
}

impl EffectStrength {
    /// Interpolation position between a volume table's min and max.
    pub fn position(self) -> f32 {
        match self {
            EffectStrength::Light => 0.0,
            EffectStrength::Medium => 0.5,
            EffectStrength::Strong => 1.0,
        }
    }
}

impl CompositePrimitive {
    /// Bit representing this primitive in a supported-primitive mask.
    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_values() {
        assert_eq!(Effect::try_from(21), Ok(Effect::TextureTick));
        assert_eq!(EffectStrength::try_from(2), Ok(EffectStrength::Strong));
        assert_eq!(CompositePrimitive::try_from(7), Ok(CompositePrimitive::LightTick));
        assert_eq!(Braking::try_from(1), Ok(Braking::Clab));
    }

    #[test]
    fn test_decode_unknown_is_illegal_argument() {
        assert!(matches!(
            Effect::try_from(22),
            Err(HapticError::IllegalArgument(_))
        ));
        assert!(matches!(
            EffectStrength::try_from(-1),
            Err(HapticError::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_all_is_in_wire_order() {
        assert_eq!(Effect::ALL.len(), 22);
        for (i, effect) in Effect::ALL.iter().enumerate() {
            assert_eq!(effect.raw() as usize, i);
        }
    }

    #[test]
    fn test_strength_positions_monotonic() {
        assert!(EffectStrength::Light.position() < EffectStrength::Medium.position());
        assert!(EffectStrength::Medium.position() < EffectStrength::Strong.position());
    }
}
