//! Call-site selectors.
//!
//! A selector names the callee of the call instruction a call-site patch
//! instruments. The accepted shapes are `Type.Member`, `Type::Member` and a bare
//! `Member`; when both separators appear, `.` takes precedence. Any string that
//! does not split into exactly an owner and a member falls back to name-only
//! matching against the whole raw string, so parsing never fails.

use std::fmt;

use crate::metadata::method::Method;

/// Names the callee a call-site patch instruments.
///
/// An absent owner means the selector matches by member name alone, across
/// every declaring type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSiteSelector {
    raw: String,
    owner: Option<String>,
    member: String,
}

impl CallSiteSelector {
    /// Parses a selector from its string form.
    ///
    /// Splits on `.` when present, otherwise on `::`. Exactly two non-trivial
    /// parts yield an owner and a member; anything else (a bare name, a
    /// multi-dot string, an empty owner) matches by member name only.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let parts: Vec<&str> = if raw.contains('.') {
            raw.split('.').collect()
        } else {
            raw.split("::").collect()
        };

        if parts.len() == 2 && !parts[0].is_empty() {
            CallSiteSelector {
                raw: raw.to_string(),
                owner: Some(parts[0].to_string()),
                member: parts[1].to_string(),
            }
        } else if parts.len() == 2 {
            CallSiteSelector {
                raw: raw.to_string(),
                owner: None,
                member: parts[1].to_string(),
            }
        } else {
            CallSiteSelector {
                raw: raw.to_string(),
                owner: None,
                member: raw.to_string(),
            }
        }
    }

    /// The declaring-type component, when the selector has one.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// The member-name component.
    #[must_use]
    pub fn member(&self) -> &str {
        &self.member
    }

    /// True when this selector names the given method.
    ///
    /// The member name must match exactly; the owner only participates when the
    /// selector declares one.
    #[must_use]
    pub fn matches(&self, method: &Method) -> bool {
        if method.name != self.member {
            return false;
        }
        match &self.owner {
            Some(owner) => method.owner == *owner,
            None => true,
        }
    }
}

impl fmt::Display for CallSiteSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<&str> for CallSiteSelector {
    fn from(raw: &str) -> Self {
        CallSiteSelector::parse(raw)
    }
}

impl From<String> for CallSiteSelector {
    fn from(raw: String) -> Self {
        CallSiteSelector::parse(&raw)
    }
}
