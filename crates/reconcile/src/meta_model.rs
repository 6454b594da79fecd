//! The neutral schema representation ([`Model`], [`Field`], [`Attribute`]) and the reflection
//! pipeline ([`Described`], [`build_model`]) that produces it from an annotated Rust struct.

use facet::{Facet, Shape, Type, UserType};

use crate::error::{Error, Result};
use crate::tag::{RawAttribute, TagParser};

/// A sequence's parameters, as declared by a `seq:start,inc,min,max,cache` attribute.
///
/// A field value of `-` means "omit this clause": `min`/`max` become `NO MINVALUE`/`NO MAXVALUE`,
/// `cache` omits the `CACHE` clause entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqSpec {
    pub start: String,
    pub increment: String,
    pub min: Option<String>,
    pub max: Option<String>,
    pub cache: Option<String>,
}

/// The target of an `fk:Model.Column` attribute, before the model/column names are run through
/// a [`crate::naming::NameTransformer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FkRef {
    pub model: String,
    pub column: String,
}

/// One recognized, validated field marker, in the order it appeared in the source tag.
///
/// The planner walks this list procedurally (see [`crate::planner`]) so that, e.g., a later
/// `null` can override an earlier `notnull` exactly as the Go original's tag semantics did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Type(String),
    Pk,
    NotNull,
    Null,
    Unique,
    Default(String),
    Seq(SeqSpec),
    Id,
    Fk(FkRef),
}

/// A declared column: its name and the ordered list of markers on it.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl Field {
    /// `true` if this field carries the attribute a second time, which is a model-shape error
    /// for `Type`, `Default`, `Seq` and `Fk` (each may appear at most once).
    fn validate_single_occurrence(&self, model: &str) -> Result<()> {
        let mut has_type = false;
        let mut has_default = false;
        let mut has_seq = false;
        let mut has_fk = false;

        for attr in &self.attributes {
            let (flag, label) = match attr {
                Attribute::Type(_) => (&mut has_type, "type"),
                Attribute::Default(_) => (&mut has_default, "default"),
                Attribute::Seq(_) => (&mut has_seq, "seq"),
                Attribute::Fk(_) => (&mut has_fk, "fk"),
                _ => continue,
            };
            if *flag {
                return Err(Error::ModelShape {
                    model: model.to_string(),
                    reason: format!(
                        "field `{}` declares `{}` more than once",
                        self.name, label
                    ),
                });
            }
            *flag = true;
        }

        Ok(())
    }
}

/// The neutral description of one table, built once per descriptor and consumed once per
/// `migrate`/`drop` call.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub fields: Vec<Field>,
}

/// Implemented by anything that can describe itself as a [`Model`] — typically generated by
/// `#[derive(facet::Facet)]` plus [`build_model`], but a caller may also hand-construct a
/// `Model` and implement this trait manually.
pub trait Described {
    fn describe() -> Model
    where
        Self: Sized;
}

facet::define_attr_grammar! {
    ns "reconcile";
    crate_path ::reconcile;

    /// The single opaque tag string carried by a field, e.g. `"type:bigint;id"`.
    pub enum Attr {
        Tag(&'static str),
    }
}

/// Get the `reconcile::tag` attribute string on a field, if present.
fn field_tag(field: &facet::Field) -> Option<&'static str> {
    field.attributes.iter().find_map(|attr| {
        if attr.ns == Some("reconcile") && attr.key == "tag" {
            attr.get_as::<&str>().copied()
        } else {
            None
        }
    })
}

/// Build a [`Model`] from a type's facet reflection, reading each field's `#[facet(reconcile::tag
/// = "...")]` attribute and resolving it through [`TagParser`] and attribute validation.
///
/// Fields with no tag, or a tag of exactly `-`, are skipped. Fields whose reflected shape is a
/// struct, a reference, or a trait object are rejected.
pub fn build_model<'a, T: Facet<'a>>() -> Result<Model> {
    let shape: &Shape = T::SHAPE;
    let model_name = shape.type_identifier.to_string();

    let Type::User(UserType::Struct(struct_type)) = &shape.ty else {
        return Err(Error::ModelShape {
            model: model_name,
            reason: "only struct types can be reflected into a model".to_string(),
        });
    };

    let mut fields = Vec::new();

    for field in struct_type.fields {
        let Some(tag) = field_tag(field) else {
            continue;
        };
        if tag == "-" {
            continue;
        }

        let field_shape = field.shape.get();
        let (inner_shape, _nullable) = unwrap_option(field_shape);
        if is_unsupported_field_shape(inner_shape) {
            return Err(Error::ModelShape {
                model: model_name,
                reason: format!(
                    "field `{}` has an unsupported type for reconciliation (embedded record, reference, or trait object)",
                    field.name
                ),
            });
        }

        let raw = TagParser::parse(&model_name, field.name, tag)?;
        let attributes = resolve_attributes(&model_name, field.name, raw)?;

        let built = Field {
            name: field.name.to_string(),
            attributes,
        };
        built.validate_single_occurrence(&model_name)?;
        fields.push(built);
    }

    Ok(Model {
        name: model_name,
        fields,
    })
}

/// Unwrap `Option<T>` one layer to get the inner shape and its nullability, same idiom as the
/// reflection helper this crate's Catalog/Planner code is grounded on.
fn unwrap_option(shape: &'static Shape) -> (&'static Shape, bool) {
    let is_option = shape.type_identifier == "Option"
        || shape.type_identifier == "core::option::Option"
        || shape.type_identifier == "std::option::Option";

    if is_option {
        if let Some(inner) = shape.inner {
            return (inner, true);
        }
    }
    (shape, false)
}

fn is_unsupported_field_shape(shape: &'static Shape) -> bool {
    // Trait objects and references don't implement `Facet` and so never reach this point;
    // the one shape we still need to reject here is an embedded record field.
    matches!(shape.ty, Type::User(UserType::Struct(_)))
}

fn resolve_attributes(model: &str, field: &str, raw: Vec<RawAttribute>) -> Result<Vec<Attribute>> {
    let mut out = Vec::new();

    for pair in raw {
        let key = pair.key.to_ascii_lowercase();
        let value_lower = pair.value.to_ascii_lowercase();

        let attr = match key.as_str() {
            "type" => Attribute::Type(pair.value),
            "default" => Attribute::Default(pair.value),
            "seq" => Attribute::Seq(parse_seq_spec(model, field, &pair.value)?),
            "fk" | "foreign key" => Attribute::Fk(parse_fk_ref(model, field, &pair.value)?),
            "" => match value_lower.as_str() {
                "pk" | "primary key" => Attribute::Pk,
                "notnull" | "not null" => Attribute::NotNull,
                "null" => Attribute::Null,
                "unique" => Attribute::Unique,
                "id" => Attribute::Id,
                other => {
                    return Err(Error::ModelShape {
                        model: model.to_string(),
                        reason: format!("field `{field}` has unknown attribute `{other}`"),
                    });
                }
            },
            other => {
                return Err(Error::ModelShape {
                    model: model.to_string(),
                    reason: format!("field `{field}` has unknown attribute key `{other}`"),
                });
            }
        };

        out.push(attr);
    }

    Ok(out)
}

fn parse_seq_spec(model: &str, field: &str, value: &str) -> Result<SeqSpec> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 5 {
        return Err(Error::TagSemantic {
            model: model.to_string(),
            field: field.to_string(),
            attribute: "seq",
            reason: format!(
                "expected exactly 5 comma-separated fields (start,inc,min,max,cache), got {}",
                parts.len()
            ),
        });
    }

    let opt = |s: &str| -> Option<String> {
        if s == "-" {
            None
        } else {
            Some(s.to_string())
        }
    };

    Ok(SeqSpec {
        start: parts[0].to_string(),
        increment: parts[1].to_string(),
        min: opt(parts[2]),
        max: opt(parts[3]),
        cache: opt(parts[4]),
    })
}

fn parse_fk_ref(model: &str, field: &str, value: &str) -> Result<FkRef> {
    let parts: Vec<&str> = value.split('.').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(Error::TagSemantic {
            model: model.to_string(),
            field: field.to_string(),
            attribute: "fk",
            reason: format!("expected `Model.Column`, got `{value}`"),
        });
    }

    Ok(FkRef {
        model: parts[0].to_string(),
        column: parts[1].to_string(),
    })
}

/// The `id` shortcut expands to this combination when the planner needs to enumerate its
/// constituent attributes (see [`crate::planner`]).
pub fn id_shortcut_seq() -> SeqSpec {
    SeqSpec {
        start: "1".to_string(),
        increment: "1".to_string(),
        min: None,
        max: None,
        cache: Some("1".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_spec_parses_dashes_as_none() {
        let spec = parse_seq_spec("M", "f", "1,1,-,-,1").unwrap();
        assert_eq!(spec.start, "1");
        assert_eq!(spec.increment, "1");
        assert_eq!(spec.min, None);
        assert_eq!(spec.max, None);
        assert_eq!(spec.cache, Some("1".to_string()));
    }

    #[test]
    fn seq_spec_wrong_arity_is_error() {
        let err = parse_seq_spec("M", "f", "1,1,-").unwrap_err();
        assert!(matches!(err, Error::TagSemantic { attribute: "seq", .. }));
    }

    #[test]
    fn fk_ref_parses_model_dot_column() {
        let fk = parse_fk_ref("M", "f", "TestUser.Id").unwrap();
        assert_eq!(fk.model, "TestUser");
        assert_eq!(fk.column, "Id");
    }

    #[test]
    fn fk_ref_missing_dot_is_error() {
        let err = parse_fk_ref("M", "f", "TestUser").unwrap_err();
        assert!(matches!(err, Error::TagSemantic { attribute: "fk", .. }));
    }

    #[test]
    fn resolve_attributes_rejects_unknown_bare_keyword() {
        let raw = vec![RawAttribute {
            key: String::new(),
            value: "bogus".to_string(),
        }];
        let err = resolve_attributes("M", "f", raw).unwrap_err();
        assert!(matches!(err, Error::ModelShape { .. }));
    }

    #[derive(Facet)]
    struct TestUser {
        #[facet(reconcile::tag = "type:bigint;id")]
        #[allow(dead_code)]
        id: i64,
        #[facet(reconcile::tag = "type:text;notnull;unique")]
        #[allow(dead_code)]
        email: String,
        #[facet(reconcile::tag = "-")]
        #[allow(dead_code)]
        ignored: String,
        #[allow(dead_code)]
        untagged: String,
    }

    #[test]
    fn build_model_reads_tags_off_a_derived_facet_struct() {
        let model = build_model::<TestUser>().unwrap();
        assert_eq!(model.name, "TestUser");
        assert_eq!(model.fields.len(), 2);

        let id = &model.fields[0];
        assert_eq!(id.name, "id");
        assert_eq!(
            id.attributes,
            vec![Attribute::Type("bigint".to_string()), Attribute::Id]
        );

        let email = &model.fields[1];
        assert_eq!(email.name, "email");
        assert_eq!(
            email.attributes,
            vec![
                Attribute::Type("text".to_string()),
                Attribute::NotNull,
                Attribute::Unique,
            ]
        );
    }

    #[test]
    fn resolve_attributes_happy_path() {
        let raw = vec![
            RawAttribute {
                key: "type".into(),
                value: "bigint".into(),
            },
            RawAttribute {
                key: "".into(),
                value: "pk".into(),
            },
            RawAttribute {
                key: "".into(),
                value: "notnull".into(),
            },
        ];
        let attrs = resolve_attributes("M", "f", raw).unwrap();
        assert_eq!(
            attrs,
            vec![
                Attribute::Type("bigint".into()),
                Attribute::Pk,
                Attribute::NotNull,
            ]
        );
    }
}
