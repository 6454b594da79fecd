//! Parses one field's raw tag string into an ordered list of `(key, value)` pairs.
//!
//! The grammar is deliberately tiny: segments are separated by `;`, and each segment is either
//! a bare keyword (`pk`, `notnull`) or a `key:value` pair (`type:bigint`). Order is preserved
//! because later occurrences of some keys (`null` vs `notnull`) are meant to win over earlier
//! ones — see [`crate::meta_model`].

use crate::error::{Error, Result};

/// One raw `(key, value)` pair as parsed directly out of a tag string, before semantic
/// resolution into an [`crate::meta_model::Attribute`].
///
/// `key` is empty for bare keywords (`pk`, `notnull`, `unique`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    pub key: String,
    pub value: String,
}

pub struct TagParser;

impl TagParser {
    /// Parse a tag string for the named model/field, used only to attribute parse errors.
    pub fn parse(model: &str, field: &str, tag: &str) -> Result<Vec<RawAttribute>> {
        let mut out = Vec::new();

        for segment in tag.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }

            let mut parts = segment.splitn(2, ':');
            let first = parts.next().unwrap_or("").trim();
            match parts.next() {
                None => {
                    // Bare keyword, no colon in this segment.
                    out.push(RawAttribute {
                        key: String::new(),
                        value: first.to_string(),
                    });
                }
                Some(rest) => {
                    if rest.contains(':') {
                        return Err(Error::ModelShape {
                            model: model.to_string(),
                            reason: format!(
                                "field `{field}` has a tag segment with more than one `:`: `{segment}`"
                            ),
                        });
                    }
                    out.push(RawAttribute {
                        key: first.to_string(),
                        value: rest.trim().to_string(),
                    });
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_pair() {
        let pairs = TagParser::parse("M", "f", "type:bigint").unwrap();
        assert_eq!(
            pairs,
            vec![RawAttribute {
                key: "type".into(),
                value: "bigint".into()
            }]
        );
    }

    #[test]
    fn bare_keyword_has_empty_key() {
        let pairs = TagParser::parse("M", "f", "pk").unwrap();
        assert_eq!(
            pairs,
            vec![RawAttribute {
                key: "".into(),
                value: "pk".into()
            }]
        );
    }

    #[test]
    fn empty_segments_are_elided_and_whitespace_trimmed() {
        let pairs = TagParser::parse("M", "f", "type:bigint ;; pk;;; notnull ; ; ").unwrap();
        assert_eq!(
            pairs,
            vec![
                RawAttribute {
                    key: "type".into(),
                    value: "bigint".into()
                },
                RawAttribute {
                    key: "".into(),
                    value: "pk".into()
                },
                RawAttribute {
                    key: "".into(),
                    value: "notnull".into()
                },
            ]
        );
    }

    #[test]
    fn trims_key_and_value() {
        let pairs = TagParser::parse("M", "f", "  type  :  varchar(20)  ").unwrap();
        assert_eq!(
            pairs,
            vec![RawAttribute {
                key: "type".into(),
                value: "varchar(20)".into()
            }]
        );
    }

    #[test]
    fn two_colons_in_one_segment_is_an_error() {
        let err = TagParser::parse("M", "f", "fk:Model:Column").unwrap_err();
        assert!(matches!(err, Error::ModelShape { .. }));
    }

    #[test]
    fn fk_value_with_dot_is_a_single_value() {
        let pairs = TagParser::parse("M", "f", "fk:TestUser.Id").unwrap();
        assert_eq!(
            pairs,
            vec![RawAttribute {
                key: "fk".into(),
                value: "TestUser.Id".into()
            }]
        );
    }

    #[test]
    fn foreign_key_bare_two_words_with_colon_value() {
        let pairs = TagParser::parse("M", "f", "foreign key:TestUser.Id").unwrap();
        assert_eq!(
            pairs,
            vec![RawAttribute {
                key: "foreign key".into(),
                value: "TestUser.Id".into()
            }]
        );
    }
}
