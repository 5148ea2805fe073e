//! Mapping by structural analysis of property types.

use super::{block_list, BuildSchema};
use crate::schema::app::{self, CoordinateDimension, GeometryType, Term, TypeRef};
use crate::schema::mapped::DiagnosticKind;
use crate::schema::mapping::{
    CodeMapping, ColumnRef, CompoundMapping, DbField, FeatureReferenceMapping, FeatureTypeMapping,
    GeometryMapping, JoinChain, Mapping, MappingKind, PrimitiveMapping, ValuePath,
    PARENT_FK_COLUMN,
};
use crate::schema::naming::MappingContext;
use crate::schema::QName;

use indexmap::IndexMap;
use tracing::{debug, warn};

/// State of one descent through a feature type's property tree.
struct Walk<'a> {
    feature_type: &'a QName,

    /// Element names from the feature type down to the current element.
    trail: Vec<QName>,

    /// (element, complex type) pairs currently being expanded.
    expanding: Vec<(QName, QName)>,
}

impl BuildSchema<'_> {
    pub(super) fn synthesize(&mut self, ft: &app::FeatureType) -> FeatureTypeMapping {
        let fid = self.default_fid(&ft.name);
        let root = self.naming.new_context(&ft.name, &fid.column);

        let mut walk = Walk {
            feature_type: &ft.name,
            trail: vec![],
            expanding: vec![],
        };

        let mut properties = IndexMap::new();
        for property in &ft.properties {
            let mapping = self.map_element(
                &mut walk,
                &root,
                &property.name,
                &property.ty,
                property.is_multi(),
            );
            properties.insert(property.name.clone(), mapping);
        }

        FeatureTypeMapping {
            name: ft.name.clone(),
            table: root.table().to_string(),
            fid,
            properties,
        }
    }

    /// Maps one element occurrence: a property of the feature type or a
    /// particle of a complex type. Multi-valued elements get a table of their
    /// own.
    fn map_element(
        &mut self,
        walk: &mut Walk<'_>,
        ctx: &MappingContext,
        name: &QName,
        ty: &TypeRef,
        multi: bool,
    ) -> Option<Mapping> {
        walk.trail.push(name.clone());
        let mapping = self.map_element_inner(walk, ctx, name, ty, multi);
        walk.trail.pop();
        mapping
    }

    fn map_element_inner(
        &mut self,
        walk: &mut Walk<'_>,
        ctx: &MappingContext,
        name: &QName,
        ty: &TypeRef,
        multi: bool,
    ) -> Option<Mapping> {
        if block_list::is_blocked(name, ty) {
            debug!(feature_type = %walk.feature_type, path = %walk.path(), "skipping block-listed element");
            self.diagnostic(
                walk.feature_type,
                walk.path(),
                DiagnosticKind::BlockListed,
                format!("element {name} is not mapped"),
            );
            return None;
        }

        if let Some(type_name) = ty.complex_name() {
            if walk.is_expanding(name, type_name) {
                warn!(feature_type = %walk.feature_type, path = %walk.path(), "skipping recursive element");
                self.diagnostic(
                    walk.feature_type,
                    walk.path(),
                    DiagnosticKind::Cycle,
                    format!("element {name} of type {type_name} is already being expanded"),
                );
                return None;
            }
        }

        let (ctx, join) = if multi {
            let child = self.naming.map_one_to_many_elements(ctx, name);
            let join = JoinChain::new(
                DbField::new(ctx.table(), ctx.key_column()),
                DbField::new(child.table(), PARENT_FK_COLUMN),
            );
            (child, Some(join))
        } else {
            (self.naming.map_one_to_one_element(ctx, name), None)
        };

        let kind = match ty {
            TypeRef::Primitive { ty } => MappingKind::Primitive(PrimitiveMapping {
                column: ColumnRef::new(self.naming.value_column(&ctx)),
                ty: *ty,
            }),
            TypeRef::Geometry { ty, dim } => {
                let column = self.naming.value_column(&ctx);
                MappingKind::Geometry(self.geometry_mapping(ctx.table(), column, *ty, *dim))
            }
            TypeRef::FeatureReference { target } => {
                MappingKind::FeatureReference(FeatureReferenceMapping {
                    column: ColumnRef::new(self.naming.value_column(&ctx)),
                    target: target.clone(),
                })
            }
            TypeRef::Code => MappingKind::Code(CodeMapping {
                value: ColumnRef::new(self.naming.value_column(&ctx)),
                code_space: ColumnRef::new(self.naming.suffixed_column(&ctx, "codespace")),
            }),
            TypeRef::Complex { name: type_name } => {
                MappingKind::Compound(self.map_complex(walk, &ctx, name, type_name)?)
            }
        };

        Some(Mapping {
            path: ValuePath::element(name.clone()),
            join,
            kind,
        })
    }

    fn map_complex(
        &mut self,
        walk: &mut Walk<'_>,
        ctx: &MappingContext,
        element: &QName,
        type_name: &QName,
    ) -> Option<CompoundMapping> {
        let app = self.app;
        let Some(complex_type) = app.complex_type(type_name) else {
            warn!(feature_type = %walk.feature_type, path = %walk.path(), ty = %type_name, "unknown complex type");
            self.diagnostic(
                walk.feature_type,
                walk.path(),
                DiagnosticKind::Unmappable,
                format!("type {type_name} is not declared"),
            );
            return None;
        };

        walk.expanding.push((element.clone(), type_name.clone()));

        let mut particles = vec![];

        for attribute in &complex_type.attributes {
            let attr = self.naming.map_one_to_one_attribute(ctx, &attribute.name);
            let column = self.naming.value_column(&attr);
            particles.push(Mapping::new(
                ValuePath::attribute(attribute.name.clone()),
                PrimitiveMapping {
                    column: ColumnRef::new(column),
                    ty: attribute.ty,
                },
            ));
        }

        if let Some(text) = complex_type.text {
            particles.push(Mapping::new(
                ValuePath::text(),
                PrimitiveMapping {
                    column: ColumnRef::new(self.naming.value_column(ctx)),
                    ty: text,
                },
            ));
        }

        for particle in &complex_type.particles {
            match &particle.term {
                Term::Wildcard { .. } => {
                    warn!(feature_type = %walk.feature_type, path = %walk.path(), "wildcard particles are not mapped");
                    self.diagnostic(
                        walk.feature_type,
                        walk.path(),
                        DiagnosticKind::Wildcard,
                        "wildcard particle is not mapped",
                    );
                }
                Term::Element { name } => {
                    let members = app.substitutions(name);
                    if members.is_empty() {
                        warn!(feature_type = %walk.feature_type, path = %walk.path(), element = %name, "no concrete element declaration");
                        self.diagnostic(
                            walk.feature_type,
                            walk.path(),
                            DiagnosticKind::Unmappable,
                            format!("element {name} has no concrete declaration"),
                        );
                        continue;
                    }

                    for decl in members {
                        if let Some(mapping) =
                            self.map_element(walk, ctx, &decl.name, &decl.ty, particle.is_multi())
                        {
                            particles.push(mapping);
                        }
                    }
                }
            }
        }

        walk.expanding.pop();

        if particles.is_empty() {
            self.diagnostic(
                walk.feature_type,
                walk.path(),
                DiagnosticKind::Unmappable,
                format!("type {type_name} has no mappable content"),
            );
            return None;
        }

        Some(CompoundMapping { particles })
    }

    /// Geometry parameters come from the registry entry of an existing
    /// column, falling back to the storage CRS.
    pub(super) fn geometry_mapping(
        &self,
        table: &str,
        column: String,
        ty: GeometryType,
        dim: Option<CoordinateDimension>,
    ) -> GeometryMapping {
        let registered = self
            .physical
            .and_then(|physical| physical.column(table, &column))
            .and_then(|column| column.geometry.clone());

        match registered {
            Some(registered) => GeometryMapping {
                column: ColumnRef::new(column),
                ty: registered.ty,
                dim: dim.unwrap_or(registered.dim),
                crs: registered.crs,
                srid: registered.srid,
            },
            None => GeometryMapping {
                column: ColumnRef::new(column),
                ty,
                dim: dim.unwrap_or_default(),
                crs: self.storage_crs.clone(),
                srid: self.storage_srid,
            },
        }
    }
}

impl Walk<'_> {
    fn is_expanding(&self, element: &QName, type_name: &QName) -> bool {
        self.expanding
            .iter()
            .any(|(e, t)| e == element && t == type_name)
    }

    fn path(&self) -> String {
        let mut path = String::new();
        for (i, name) in self.trail.iter().enumerate() {
            if i > 0 {
                path.push('/');
            }
            path.push_str(&name.to_string());
        }
        path
    }
}
