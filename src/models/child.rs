//! Matched child identity.

use serde::Serialize;

/// One child known to both services, paired by name.
///
/// Recomputed on every run; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChildIdentity {
    pub first_name: String,
    pub last_name: String,

    /// Transparent Classroom child id
    pub source_id: u64,

    /// Tinybeans child id
    pub destination_id: u64,
}

impl ChildIdentity {
    /// Tab-separated line used by `show-matching-children`.
    pub fn summary_line(&self) -> String {
        format!(
            "{} {}\tTC:{}\tTB:{}",
            self.first_name, self.last_name, self.source_id, self.destination_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line() {
        let child = ChildIdentity {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            source_id: 7,
            destination_id: 70,
        };
        assert_eq!(child.summary_line(), "Ada Lovelace\tTC:7\tTB:70");
    }
}
