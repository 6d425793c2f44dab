//! Core types for spark-view-update.
//!
//! These types define the vocabulary the coordinator speaks: which kinds of
//! pending work a view can have, and the orientation context it updates in.

use std::any::Any;

use crate::error::{Result, ViewUpdateError};

// =============================================================================
// Dirty Types (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Categories of pending work for a view.
    ///
    /// Combine with bitwise OR: `DirtyType::LAYOUT | DirtyType::STYLE`.
    /// Bits at or above [`DirtyType::CUSTOM`] belong to the component and are
    /// kept as-is by every operation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirtyType: u32 {
        const NONE = 0;
        const LAYOUT = 1 << 0;
        const STATE = 1 << 1;
        const DATA = 1 << 2;
        const LOCALE = 1 << 3;
        const CONFIG = 1 << 4;
        const STYLE = 1 << 5;
        const ORIENTATION = 1 << 6;
        /// Every built-in category.
        const ALL = Self::LAYOUT.bits()
            | Self::STATE.bits()
            | Self::DATA.bits()
            | Self::LOCALE.bits()
            | Self::CONFIG.bits()
            | Self::STYLE.bits()
            | Self::ORIENTATION.bits();
        /// First bit available for component-defined categories.
        const CUSTOM = 1 << 7;

        const _ = !0;
    }
}

impl DirtyType {
    /// Number of custom bits above [`DirtyType::CUSTOM`].
    pub const CUSTOM_SLOTS: u32 = 25;

    /// The `n`-th component-defined category.
    ///
    /// Returns `None` when `n` does not fit in the 32-bit mask.
    pub const fn custom(n: u32) -> Option<Self> {
        if n < Self::CUSTOM_SLOTS {
            Some(Self::from_bits_retain(Self::CUSTOM.bits() << n))
        } else {
            None
        }
    }

    /// Unbox a type-erased dirty value.
    ///
    /// Accepts a `DirtyType` or any primitive integer that fits in 32
    /// unsigned bits. Anything else is a configuration error.
    pub fn from_object(object: &dyn Any) -> Result<Self> {
        if let Some(dirty_type) = object.downcast_ref::<DirtyType>() {
            return Ok(*dirty_type);
        }

        macro_rules! unbox_integer {
            ($($int:ty),+) => {
                $(
                    if let Some(value) = object.downcast_ref::<$int>() {
                        return Self::from_integer(*value);
                    }
                )+
            };
        }
        unbox_integer!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

        Err(ViewUpdateError::UnsupportedDirtyObject {
            type_name: describe_object(object),
        })
    }

    fn from_integer<T>(value: T) -> Result<Self>
    where
        T: Copy + ToString,
        u32: TryFrom<T>,
    {
        u32::try_from(value)
            .map(Self::from_bits_retain)
            .map_err(|_| ViewUpdateError::InvalidDirtyValue {
                value: value.to_string(),
            })
    }
}

/// Short description of a rejected erased value for error messages.
fn describe_object(object: &dyn Any) -> String {
    if let Some(s) = object.downcast_ref::<&str>() {
        format!("&str ({s:?})")
    } else if let Some(s) = object.downcast_ref::<String>() {
        format!("String ({s:?})")
    } else if object.is::<f32>() || object.is::<f64>() {
        "float".to_string()
    } else if object.is::<bool>() {
        "bool".to_string()
    } else {
        "unknown".to_string()
    }
}

// =============================================================================
// Interface Orientation
// =============================================================================

/// Orientation of the interface a view is presented in.
///
/// Carried by the coordinator as context for the host's `update()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterfaceOrientation {
    #[default]
    Unknown,
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl InterfaceOrientation {
    pub fn is_portrait(self) -> bool {
        matches!(self, Self::Portrait | Self::PortraitUpsideDown)
    }

    pub fn is_landscape(self) -> bool {
        matches!(self, Self::LandscapeLeft | Self::LandscapeRight)
    }
}
