//! Derivation of table and column names from element paths.
//!
//! Names are allocated in traversal order, so processing the same schema
//! twice yields the same names.

use super::mapping::{CHILD_KEY_COLUMN, PARENT_FK_COLUMN};
use super::QName;

use heck::ToSnakeCase;
use indexmap::{IndexMap, IndexSet};

/// Longest identifier PostgreSQL keeps without truncating.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Allocates unique table names, and unique column names per table.
#[derive(Debug, Default)]
pub struct NamingManager {
    tables: IndexSet<String>,
    columns: IndexMap<String, IndexSet<String>>,
}

/// Position of the naming walk: the table values currently land in, and the
/// column allocated for the current element, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingContext {
    table: String,
    key_column: String,
    column: Option<String>,
}

impl NamingManager {
    pub fn new() -> NamingManager {
        NamingManager::default()
    }

    /// Allocates the root table of a feature type and reserves its key
    /// column.
    pub fn new_context(&mut self, feature_type: &QName, fid_column: &str) -> MappingContext {
        let table = self.allocate_table(&sanitize(&feature_type.local));
        self.reserve_column(&table, fid_column);
        MappingContext {
            table,
            key_column: fid_column.to_string(),
            column: None,
        }
    }

    /// Starts a context on a table whose name is given, rather than derived.
    pub fn explicit_context(&mut self, table: &str, fid_column: &str) -> MappingContext {
        let table = table.to_ascii_lowercase();
        self.tables.insert(table.clone());
        self.reserve_column(&table, fid_column);
        MappingContext {
            table,
            key_column: fid_column.to_string(),
            column: None,
        }
    }

    /// Allocates a column for a single-valued child element in the context's
    /// table.
    pub fn map_one_to_one_element(&mut self, ctx: &MappingContext, name: &QName) -> MappingContext {
        self.map_one_to_one(ctx, &name.local)
    }

    /// Allocates a column for an attribute of the context's element.
    pub fn map_one_to_one_attribute(&mut self, ctx: &MappingContext, name: &QName) -> MappingContext {
        self.map_one_to_one(ctx, &name.local)
    }

    /// Allocates a child table for a multi-valued element. The returned
    /// context points at the new table; `id` and `parentfk` are reserved in
    /// it.
    pub fn map_one_to_many_elements(
        &mut self,
        ctx: &MappingContext,
        name: &QName,
    ) -> MappingContext {
        let base = match &ctx.column {
            Some(prefix) => format!("{}_{}_{}", ctx.table, prefix, sanitize(&name.local)),
            None => format!("{}_{}", ctx.table, sanitize(&name.local)),
        };
        let table = self.allocate_table(&base);
        self.reserve_column(&table, CHILD_KEY_COLUMN);
        self.reserve_column(&table, PARENT_FK_COLUMN);

        MappingContext {
            table,
            key_column: CHILD_KEY_COLUMN.to_string(),
            column: None,
        }
    }

    /// The column holding the context element's own value: the column
    /// allocated for it, or a `value` column for elements that got a table of
    /// their own.
    pub fn value_column(&mut self, ctx: &MappingContext) -> String {
        match &ctx.column {
            Some(column) => column.clone(),
            None => self.allocate_column(&ctx.table, "value"),
        }
    }

    /// Allocates a column derived from the context's column and `suffix`,
    /// e.g. `kind_codespace`, or just `codespace` in a child table.
    pub fn suffixed_column(&mut self, ctx: &MappingContext, suffix: &str) -> String {
        let base = match &ctx.column {
            Some(column) => format!("{column}_{suffix}"),
            None => suffix.to_string(),
        };
        self.allocate_column(&ctx.table, &base)
    }

    fn map_one_to_one(&mut self, ctx: &MappingContext, local: &str) -> MappingContext {
        let base = match &ctx.column {
            Some(prefix) => format!("{prefix}_{}", sanitize(local)),
            None => sanitize(local),
        };
        let column = self.allocate_column(&ctx.table, &base);
        MappingContext {
            table: ctx.table.clone(),
            key_column: ctx.key_column.clone(),
            column: Some(column),
        }
    }

    fn allocate_table(&mut self, base: &str) -> String {
        let name = unique(base, |candidate| self.tables.contains(candidate));
        self.tables.insert(name.clone());
        name
    }

    fn allocate_column(&mut self, table: &str, base: &str) -> String {
        let taken = self.columns.entry(table.to_string()).or_default();
        let name = unique(base, |candidate| taken.contains(candidate));
        taken.insert(name.clone());
        name
    }

    fn reserve_column(&mut self, table: &str, column: &str) {
        self.columns
            .entry(table.to_string())
            .or_default()
            .insert(column.to_ascii_lowercase());
    }
}

impl MappingContext {
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Key column of the context's table, referenced by child tables.
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }
}

/// Lower-case identifier made of ASCII alphanumerics and underscores.
fn sanitize(local: &str) -> String {
    let mut name: String = local
        .to_snake_case()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// First of `base`, `base_2`, `base_3`, ... not rejected by `taken`, each
/// truncated to the identifier length limit.
fn unique(base: &str, taken: impl Fn(&str) -> bool) -> String {
    let candidate = truncate(base, MAX_IDENTIFIER_LEN);
    if !taken(candidate) {
        return candidate.to_string();
    }

    let mut n = 2usize;
    loop {
        let suffix = format!("_{n}");
        let candidate = format!(
            "{}{suffix}",
            truncate(base, MAX_IDENTIFIER_LEN - suffix.len())
        );
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://example.org/app";

    fn q(local: &str) -> QName {
        QName::new(NS, local)
    }

    #[test]
    fn root_and_columns() {
        let mut names = NamingManager::new();
        let ctx = names.new_context(&q("Building"), "id");
        assert_eq!(ctx.table(), "building");

        let name = names.map_one_to_one_element(&ctx, &q("name"));
        assert_eq!(name.table(), "building");
        assert_eq!(name.column(), Some("name"));
    }

    #[test]
    fn collisions_after_lower_casing() {
        let mut names = NamingManager::new();
        let ctx = names.new_context(&q("Building"), "id");

        let a = names.map_one_to_one_element(&ctx, &q("Name"));
        let b = names.map_one_to_one_element(&ctx, &q("name"));
        let c = names.map_one_to_one_element(&ctx, &q("id"));
        assert_eq!(a.column(), Some("name"));
        assert_eq!(b.column(), Some("name_2"));
        assert_eq!(c.column(), Some("id_2"));
    }

    #[test]
    fn one_to_many_allocates_child_table() {
        let mut names = NamingManager::new();
        let ctx = names.new_context(&q("Building"), "id");
        let child = names.map_one_to_many_elements(&ctx, &q("name"));
        assert_eq!(child.table(), "building_name");
        assert_eq!(child.key_column(), "id");
        assert_eq!(names.value_column(&child), "value");

        let nested = names.map_one_to_one_element(&ctx, &q("address"));
        let phone = names.map_one_to_many_elements(&nested, &q("phone"));
        assert_eq!(phone.table(), "building_address_phone");
    }

    #[test]
    fn long_names_are_truncated() {
        let mut names = NamingManager::new();
        let long = "a".repeat(80);
        let first = names.new_context(&q(&long), "id");
        let second = names.new_context(&q(&long), "id");
        assert_eq!(first.table().len(), MAX_IDENTIFIER_LEN);
        assert_eq!(second.table().len(), MAX_IDENTIFIER_LEN);
        assert!(second.table().ends_with("_2"));
    }

    #[test]
    fn naming_is_deterministic() {
        fn run() -> Vec<String> {
            let mut names = NamingManager::new();
            let ctx = names.new_context(&q("Road"), "id");
            let lanes = names.map_one_to_many_elements(&ctx, &q("lane"));
            vec![
                ctx.table().to_string(),
                names.map_one_to_one_element(&ctx, &q("name")).column().unwrap().to_string(),
                lanes.table().to_string(),
                names.value_column(&lanes),
            ]
        }
        assert_eq!(run(), run());
    }
}
