//! The accessor contract surfaces.
//!
//! Hosts resolve resources through a fixed set of accessor operations. This
//! module is the declarative description of that set: every overridable
//! accessor is one [`AccessorKind`] carrying its argument shape and the
//! return contract the override machinery must coerce to. The interception
//! layer never guesses method shapes at runtime; it walks
//! [`resource_accessor_descriptors`] and classifies each entry through
//! [`AccessorKind::from_descriptor`], skipping whatever it cannot classify.
//!
//! Two surfaces exist:
//!
//! - the general resource accessor surface ([`RESOURCE_SURFACE`]), where
//!   every interceptable method takes a numeric identifier as its first
//!   argument, optionally followed by one or two secondary words, and
//! - the narrower typed-attribute-block surface ([`TYPED_SURFACE`]), whose
//!   accessors address a packed slot array by index instead of taking an
//!   identifier directly.

use rsk_intercept::MethodDescriptor;

/// Contract surface name for the general resource accessors.
pub const RESOURCE_SURFACE: &str = "resources";

/// Contract surface name for the typed-attribute-block accessors.
pub const TYPED_SURFACE: &str = "typed-block";

/// The one interceptable typed-block accessor: `color_at(index, default)`.
pub const TYPED_COLOR_AT: MethodDescriptor = MethodDescriptor::new(TYPED_SURFACE, "color_at", 2);

/// Trailing argument pattern of an identifier-taking accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShape {
    /// `(id)`
    Id,
    /// `(id, secondary)`
    IdSecondary,
    /// `(id, secondary, tertiary)`
    IdSecondaryTertiary,
}

impl ParamShape {
    /// Argument count of the shape.
    pub const fn arity(self) -> usize {
        match self {
            ParamShape::Id => 1,
            ParamShape::IdSecondary => 2,
            ParamShape::IdSecondaryTertiary => 3,
        }
    }
}

/// The exact type an accessor is contractually obligated to return.
///
/// Replacement values are normalized to this shape before an intercepted
/// call is short-circuited; a value that cannot be normalized is treated as
/// "no override".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// Integral result; numeric replacements are rounded.
    RoundedInt,
    /// Floating-point result; integral replacements are widened.
    Float,
    /// Boolean result, no coercion.
    Bool,
    /// Text result, no coercion.
    Text,
    /// The replacement value is returned as stored.
    Passthrough,
}

/// Every overridable accessor on the general resource surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorKind {
    Integer,
    Boolean,
    Float,
    Text,
    Dimension,
    DimensionOffset,
    DimensionSize,
    Color,
    Fraction,
    Layout,
    Animation,
    IntList,
    StringList,
    TextList,
    ImageForDensity,
}

impl AccessorKind {
    /// All overridable accessors, in surface declaration order.
    pub const ALL: [AccessorKind; 15] = [
        AccessorKind::Integer,
        AccessorKind::Boolean,
        AccessorKind::Float,
        AccessorKind::Text,
        AccessorKind::Dimension,
        AccessorKind::DimensionOffset,
        AccessorKind::DimensionSize,
        AccessorKind::Color,
        AccessorKind::Fraction,
        AccessorKind::Layout,
        AccessorKind::Animation,
        AccessorKind::IntList,
        AccessorKind::StringList,
        AccessorKind::TextList,
        AccessorKind::ImageForDensity,
    ];

    /// Method name on the resource surface.
    pub const fn name(self) -> &'static str {
        match self {
            AccessorKind::Integer => "integer",
            AccessorKind::Boolean => "boolean",
            AccessorKind::Float => "float",
            AccessorKind::Text => "text",
            AccessorKind::Dimension => "dimension",
            AccessorKind::DimensionOffset => "dimension_offset",
            AccessorKind::DimensionSize => "dimension_size",
            AccessorKind::Color => "color",
            AccessorKind::Fraction => "fraction",
            AccessorKind::Layout => "layout",
            AccessorKind::Animation => "animation",
            AccessorKind::IntList => "int_list",
            AccessorKind::StringList => "string_list",
            AccessorKind::TextList => "text_list",
            AccessorKind::ImageForDensity => "image_for_density",
        }
    }

    /// Argument shape of the overridable overload.
    pub const fn shape(self) -> ParamShape {
        match self {
            AccessorKind::Color => ParamShape::IdSecondary,
            AccessorKind::Fraction | AccessorKind::ImageForDensity => {
                ParamShape::IdSecondaryTertiary
            }
            _ => ParamShape::Id,
        }
    }

    /// Return contract of the accessor.
    pub const fn returns(self) -> ReturnShape {
        match self {
            AccessorKind::Integer
            | AccessorKind::Color
            | AccessorKind::DimensionOffset
            | AccessorKind::DimensionSize => ReturnShape::RoundedInt,
            AccessorKind::Dimension | AccessorKind::Float | AccessorKind::Fraction => {
                ReturnShape::Float
            }
            AccessorKind::Boolean => ReturnShape::Bool,
            AccessorKind::Text => ReturnShape::Text,
            AccessorKind::Layout
            | AccessorKind::Animation
            | AccessorKind::IntList
            | AccessorKind::StringList
            | AccessorKind::TextList
            | AccessorKind::ImageForDensity => ReturnShape::Passthrough,
        }
    }

    /// Descriptor of the overridable overload on the resource surface.
    pub const fn descriptor(self) -> MethodDescriptor {
        MethodDescriptor::new(RESOURCE_SURFACE, self.name(), self.shape().arity())
    }

    /// Classify a surface descriptor.
    ///
    /// Returns `None` for descriptors that are not an overridable accessor,
    /// including same-named overloads with a different argument count.
    pub fn from_descriptor(descriptor: &MethodDescriptor) -> Option<Self> {
        if descriptor.surface != RESOURCE_SURFACE {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == descriptor.name && kind.shape().arity() == descriptor.arity)
    }
}

/// Every method declared on the general resource accessor surface.
///
/// This is the contract the interception layer enumerates. It contains more
/// than the overridable set: overloads whose trailing arguments are not the
/// plain identifier pattern (the text-with-fallback overload, reverse
/// identifier lookup) are declared here and must be skipped by
/// classification.
pub fn resource_accessor_descriptors() -> Vec<MethodDescriptor> {
    let mut descriptors: Vec<MethodDescriptor> =
        AccessorKind::ALL.iter().map(|kind| kind.descriptor()).collect();
    descriptors.push(MethodDescriptor::new(RESOURCE_SURFACE, "text", 2));
    descriptors.push(MethodDescriptor::new(RESOURCE_SURFACE, "identifier_of", 3));
    descriptors
}

/// Every method declared on the typed-attribute-block surface.
pub fn typed_accessor_descriptors() -> Vec<MethodDescriptor> {
    vec![TYPED_COLOR_AT]
}
