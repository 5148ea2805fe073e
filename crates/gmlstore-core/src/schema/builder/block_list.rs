use crate::schema::app::TypeRef;
use crate::schema::{QName, GMD_NS};

/// ISO 19115 types known to expand into unmanageable table trees.
const ISO_TYPES: &[&str] = &["CI_Citation", "CI_Contact", "EX_Extent"];

/// GML temporal constructs that are not mapped.
const GML_TYPES: &[&str] = &["TimePeriod", "TimeOrdinalEra"];

/// True if an element is never mapped, whatever its position in the tree.
pub(super) fn is_blocked(element: &QName, ty: &TypeRef) -> bool {
    if blocked_name(element) {
        return true;
    }
    ty.complex_name().is_some_and(blocked_name)
}

fn blocked_name(name: &QName) -> bool {
    let local = strip_type_suffix(&name.local);

    if name.namespace() == Some(GMD_NS) {
        return ISO_TYPES.contains(&local);
    }

    if name.is_gml() {
        return GML_TYPES.contains(&local) || local.ends_with("CRS");
    }

    false
}

/// `CI_Citation_Type` and `CI_Citation_PropertyType` both name a citation.
fn strip_type_suffix(local: &str) -> &str {
    local
        .strip_suffix("_PropertyType")
        .or_else(|| local.strip_suffix("_Type"))
        .or_else(|| local.strip_suffix("PropertyType"))
        .or_else(|| local.strip_suffix("Type"))
        .unwrap_or(local)
}
