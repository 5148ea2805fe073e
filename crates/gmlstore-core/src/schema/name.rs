use serde::{Deserialize, Serialize};
use std::{fmt, hash::Hash};

/// Namespace of GML 3.1 / 3.0 schemas.
pub const GML_NS: &str = "http://www.opengis.net/gml";

/// Namespace of GML 3.2 schemas.
pub const GML32_NS: &str = "http://www.opengis.net/gml/3.2";

/// Namespace of ISO 19139 metadata elements.
pub const GMD_NS: &str = "http://www.isotc211.org/2005/gmd";

/// Namespace of the XLink attributes used for feature references.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// A namespace-qualified XML name.
///
/// Two names are equal when namespace and local part match; the prefix is
/// only kept for display.
#[derive(Debug, Clone, Serialize, Deserialize, Eq)]
pub struct QName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    pub local: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            prefix: None,
            local: local.into(),
        }
    }

    pub fn prefixed(
        namespace: impl Into<String>,
        prefix: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        Self {
            namespace: Some(namespace.into()),
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }

    pub fn local(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            prefix: None,
            local: local.into(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// True if the name lives in one of the GML namespaces.
    pub fn is_gml(&self) -> bool {
        matches!(self.namespace(), Some(GML_NS | GML32_NS))
    }

    /// The name in Clark notation, `{namespace}local`.
    pub fn clark(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{{{ns}}}{}", self.local),
            _ => self.local.clone(),
        }
    }

    /// Parses a name in Clark notation or as `prefix:local`, resolving the
    /// prefix with `resolve`.
    pub fn parse(
        src: &str,
        resolve: impl Fn(&str) -> Option<String>,
    ) -> Result<QName, String> {
        if let Some(rest) = src.strip_prefix('{') {
            let Some((ns, local)) = rest.split_once('}') else {
                return Err(format!("unterminated namespace in `{src}`"));
            };
            if local.is_empty() {
                return Err(format!("missing local name in `{src}`"));
            }
            return Ok(QName::new(ns, local));
        }

        match src.split_once(':') {
            Some((prefix, local)) => {
                let Some(ns) = resolve(prefix) else {
                    return Err(format!("unbound namespace prefix `{prefix}` in `{src}`"));
                };
                Ok(QName::prefixed(ns, prefix, local))
            }
            None if !src.is_empty() => Ok(QName::local(src)),
            None => Err("empty name".to_string()),
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local && self.namespace() == other.namespace()
    }
}

impl Hash for QName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.namespace().hash(state);
        self.local.hash(state);
    }
}

impl PartialOrd for QName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.namespace(), &self.local).cmp(&(other.namespace(), &other.local))
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) if !prefix.is_empty() => write!(f, "{prefix}:{}", self.local),
            _ => f.write_str(&self.clark()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_does_not_affect_identity() {
        let a = QName::prefixed("http://example.org/app", "app", "Building");
        let b = QName::new("http://example.org/app", "Building");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "app:Building");
        assert_eq!(b.to_string(), "{http://example.org/app}Building");
    }

    #[test]
    fn parse_clark_and_prefixed() {
        let resolve = |p: &str| (p == "app").then(|| "http://example.org/app".to_string());

        let clark = QName::parse("{http://example.org/app}name", resolve).unwrap();
        let prefixed = QName::parse("app:name", resolve).unwrap();
        assert_eq!(clark, prefixed);

        assert!(QName::parse("xx:name", resolve).is_err());
        assert!(QName::parse("{http://example.org/app", resolve).is_err());
    }
}
