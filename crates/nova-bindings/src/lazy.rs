/// A derived field that is computed on first access.
///
/// `Building` marks a computation in progress. Reaching it again means the
/// computation re-entered itself (e.g. a method signature mentions a type
/// whose members are being built); callers then see a partial result
/// instead of recursing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Lazy<T> {
    #[default]
    Unbuilt,
    Building,
    Built(T),
}

impl<T> Lazy<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Lazy::Built(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self, Lazy::Built(_))
    }

    pub fn is_building(&self) -> bool {
        matches!(self, Lazy::Building)
    }

    /// Moves `Unbuilt` to `Building`. Returns `false` if already past
    /// `Unbuilt`.
    pub(crate) fn start(&mut self) -> bool {
        if matches!(self, Lazy::Unbuilt) {
            *self = Lazy::Building;
            true
        } else {
            false
        }
    }

    /// Stores the value. A built cell is never rebuilt.
    pub(crate) fn finish(&mut self, value: T) {
        if !self.is_built() {
            *self = Lazy::Built(value);
        }
    }
}
