use std::fmt;

/// How one edge of one axis handles window taps that fall outside the input.
///
/// Example for an input `a b c d` and a kernel reaching two taps past the end:
///
/// - [`BorderTreatment::Avoid`]: `...b c d |` (no output position reaches past `d`)
/// - [`BorderTreatment::Constant`]: `...b c d | v v` (taps read the fill value `v`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BorderTreatment<T> {
    /// Output positions whose window would leave the input do not exist.
    ///
    /// Padding configured on an edge with this treatment is not applied.
    Avoid,

    /// Out-of-range taps read the given fill value.
    Constant(T),
}

impl<T> BorderTreatment<T> {
    /// Create a treatment that drops the windows leaving the input.
    pub fn avoid() -> Self {
        BorderTreatment::Avoid
    }

    /// Create a treatment that fills out-of-range taps with `value`.
    pub fn constant(value: T) -> Self {
        BorderTreatment::Constant(value)
    }

    /// Returns true for [`BorderTreatment::Avoid`].
    pub fn is_avoid(&self) -> bool {
        matches!(self, BorderTreatment::Avoid)
    }

    /// The padding that is actually honored on this edge.
    ///
    /// # Arguments
    ///
    /// * `padding` - The nominal padding configured for the edge.
    ///
    /// # Returns
    ///
    /// `padding` for a constant edge and `0` for an avoided edge.
    ///
    /// # Example
    ///
    /// ```
    /// use kornia_conv::BorderTreatment;
    ///
    /// assert_eq!(BorderTreatment::constant(0u8).effective_padding(2), 2);
    /// assert_eq!(BorderTreatment::<u8>::avoid().effective_padding(2), 0);
    /// ```
    pub fn effective_padding(&self, padding: usize) -> usize {
        match self {
            BorderTreatment::Avoid => 0,
            BorderTreatment::Constant(_) => padding,
        }
    }
}

impl<T: Copy> BorderTreatment<T> {
    /// The fill value, only defined for [`BorderTreatment::Constant`].
    pub fn fill_value(&self) -> Option<T> {
        match self {
            BorderTreatment::Avoid => None,
            BorderTreatment::Constant(value) => Some(*value),
        }
    }
}

impl<T> Default for BorderTreatment<T> {
    fn default() -> Self {
        BorderTreatment::Avoid
    }
}

impl<T: fmt::Display> fmt::Display for BorderTreatment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BorderTreatment::Avoid => write!(f, "Avoid"),
            BorderTreatment::Constant(value) => write!(f, "Constant({value})"),
        }
    }
}
