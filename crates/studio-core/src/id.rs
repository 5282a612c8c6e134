//! Widget identifiers.
//!
//! Ids come from three places: markup (`id="…"`), builder elements and
//! saved layouts. Anything the editor creates itself (pastes, template
//! instances, elements without an id) gets a generated one.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Next suffix for generated ids, shared by every prefix.
static NEXT_SUFFIX: AtomicU64 = AtomicU64::new(0);

/// Interned widget id: `Copy`, compared by handle.
///
/// Uniqueness is a property of the collection holding the widgets, not of
/// the id itself: two imports may both produce `widget_0`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(Spur);

impl WidgetId {
    pub fn intern(s: &str) -> Self {
        WidgetId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// A generated id of the form `w_17`.
    pub fn fresh() -> Self {
        Self::with_prefix("w")
    }

    /// A generated `{prefix}_{n}` id that no loaded widget already uses.
    ///
    /// Names seen so far are all interned, so a candidate that is already
    /// in the interner came from some import and is skipped.
    pub fn with_prefix(prefix: &str) -> Self {
        loop {
            let n = NEXT_SUFFIX.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{prefix}_{n}");
            if !INTERNER.contains(&candidate) {
                return Self::intern(&candidate);
            }
        }
    }
}

impl fmt::Debug for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for WidgetId {
    fn default() -> Self {
        Self::fresh()
    }
}

impl Serialize for WidgetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Blank ids in saved layouts are replaced with generated ones.
impl<'de> Deserialize<'de> for WidgetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.trim() {
            "" => Ok(WidgetId::fresh()),
            _ => Ok(WidgetId::intern(&s)),
        }
    }
}
