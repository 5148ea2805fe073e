/// Table storing every feature as an encoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMapping {
    pub table: String,

    /// Internal integer key, shared with the relational feature tables in
    /// hybrid mode.
    pub id_column: String,

    /// External feature id.
    pub gml_id_column: String,

    /// Feature type discriminator, referencing the registry table.
    pub type_column: String,

    pub data_column: String,

    pub bbox_column: String,
}

/// Registry table assigning each feature type a small integer id and
/// tracking its extent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BBoxTableMapping {
    pub table: String,
    pub id_column: String,
    pub qname_column: String,
    pub bbox_column: String,
}

impl Default for BlobMapping {
    fn default() -> Self {
        BlobMapping {
            table: "gml_objects".to_string(),
            id_column: "id".to_string(),
            gml_id_column: "gml_id".to_string(),
            type_column: "ft_type".to_string(),
            data_column: "binary_object".to_string(),
            bbox_column: "gml_bounded_by".to_string(),
        }
    }
}

impl Default for BBoxTableMapping {
    fn default() -> Self {
        BBoxTableMapping {
            table: "feature_types".to_string(),
            id_column: "id".to_string(),
            qname_column: "qname".to_string(),
            bbox_column: "bbox".to_string(),
        }
    }
}
