/*!
The schema compiler. A single recursive descent over a [`Schema`] that
classifies every field into a token kind and builds the tree of
[`CommandNode`]s. Every check on the schema itself happens here, before any
argument is looked at.

| shape        | requirement | token                          |
|--------------|-------------|--------------------------------|
| `Flag`       | any         | flag (required if `Required`)  |
| `Collection` | any         | collection                     |
| `Value`      | `Required`  | positional                     |
| `Value`      | `Optional`  | keyword                        |
| `Subcommand` | `Required`  | subcommand group               |
*/

use std::collections::HashMap;

use crate::{
    arg,
    errors::{quoted_list, SchemaError},
    node::{CommandNode, SubcommandGroup},
    schema::{Field, Requirement, Schema, Shape, ValueType},
    settings::Settings,
    token::{FieldDescriptor, Token, TokenKind},
    value::Value,
};

/// Compile a schema with the default [`Settings`]
pub fn compile(schema: &Schema) -> Result<CommandNode, SchemaError> {
    compile_with(schema, &Settings::default())
}

pub fn compile_with(schema: &Schema, settings: &Settings) -> Result<CommandNode, SchemaError> {
    compile_node(schema, Vec::from([schema.name().to_owned()]), settings)
}

fn descriptor(field: &Field, value_type: ValueType) -> FieldDescriptor {
    let (required, default) = match field.requirement() {
        Requirement::Required => (true, None),
        Requirement::Optional(default) => (false, default.clone()),
    };

    FieldDescriptor {
        name: field.name().to_owned(),
        display: arg::display_name(field.name()),
        required,
        default,
        value_type,
        choices: field.allowed_values().map(<[String]>::to_vec),
        short: field.short_alias(),
        description: field.description().to_owned(),
    }
}

fn keys(field: &Field) -> Vec<String> {
    let mut keys = Vec::from([arg::long_key(field.name())]);
    keys.extend(field.short_alias().map(arg::short_key));
    keys
}

fn flag_kind(field: &Field) -> TokenKind {
    let on = keys(field);
    let mut off = Vec::from([arg::false_key(field.name())]);
    off.extend(field.short_alias().map(arg::false_short_key));

    match field.requirement() {
        Requirement::Optional(Some(Value::Bool(true))) => TokenKind::Flag {
            on: Vec::new(),
            off,
        },
        Requirement::Optional(Some(_)) => TokenKind::Flag {
            on,
            off: Vec::new(),
        },
        Requirement::Required | Requirement::Optional(None) => TokenKind::Flag { on, off },
    }
}

/// Whether a default of this shape is a value the field could have parsed
/// itself
fn fits(ty: ValueType, value: &Value) -> bool {
    match (ty, value) {
        (ValueType::String, Value::Str(_))
        | (ValueType::Integer, Value::Int(_))
        | (ValueType::Float, Value::Float(_))
        | (ValueType::Boolean, Value::Bool(_))
        | (ValueType::Path | ValueType::ExistingFile, Value::Path(_)) => true,
        (ValueType::NonNegativeInteger, &Value::Int(value)) => value >= 0,
        _ => false,
    }
}

/// Check a field's default against its type and allowed choices. A
/// collection's default is a list, each element of which is checked.
fn check_default(path: &[String], field: &Field) -> Result<(), SchemaError> {
    let Requirement::Optional(Some(ref default)) = *field.requirement() else {
        return Ok(());
    };

    let reject = |reason: String| SchemaError::InvalidDefault {
        path: path.to_vec(),
        field: field.name().to_owned(),
        default: default.to_string(),
        reason,
    };

    let (ty, values): (ValueType, &[Value]) = match (field.shape(), default) {
        (&Shape::Flag, value) => (ValueType::Boolean, core::slice::from_ref(value)),
        (&Shape::Value(ty), value) => (ty, core::slice::from_ref(value)),
        (&Shape::Collection(ty), Value::List(values)) => (ty, values.as_slice()),
        (&Shape::Collection(ty), _) => return Err(reject(format!("is not a list of {ty}"))),
        (&Shape::Subcommand(_), _) => return Ok(()),
    };

    if let Some(value) = values.iter().find(|value| !fits(ty, value)) {
        return Err(reject(format!("is not a {ty}: `{value}`")));
    }

    if let Some(choices) = field.allowed_values() {
        let outside = values
            .iter()
            .find(|value| !choices.iter().any(|choice| value.as_str() == Some(choice.as_str())));

        if let Some(value) = outside {
            return Err(reject(format!(
                "is not one of the allowed values {}: `{value}`",
                quoted_list(choices)
            )));
        }
    }

    Ok(())
}

/// Everything a node is built from, before it's assembled. Keeps track of
/// which field owns each key so that collisions can name both fields.
struct NodeBuilder<'s> {
    path: Vec<String>,
    settings: &'s Settings,
    positionals: Vec<Token>,
    options: Vec<Token>,
    keys: HashMap<String, usize>,
    shorts: HashMap<char, &'s str>,
    subcommands: Option<SubcommandGroup>,
}

impl<'s> NodeBuilder<'s> {
    fn register_short(&mut self, field: &'s Field) -> Result<(), SchemaError> {
        let Some(short) = field.short_alias() else {
            return Ok(());
        };

        if !short.is_ascii_graphic() || short == arg::FLAG_PREFIX {
            return Err(SchemaError::InvalidShort {
                path: self.path.clone(),
                field: field.name().to_owned(),
                short,
            });
        }

        match self.shorts.insert(short, field.name()) {
            None => Ok(()),
            Some(first) => Err(SchemaError::DuplicateShort {
                path: self.path.clone(),
                short,
                first: first.to_owned(),
                second: field.name().to_owned(),
            }),
        }
    }

    fn add_option(&mut self, token: Token) -> Result<(), SchemaError> {
        let index = self.options.len();

        for key in token.keys() {
            if self.settings.help && arg::HELP_KEYS.contains(&key) {
                return Err(SchemaError::ReservedKey {
                    path: self.path.clone(),
                    key: key.to_owned(),
                    field: token.name().to_owned(),
                });
            }

            if let Some(&first) = self.keys.get(key) {
                return Err(SchemaError::DuplicateKey {
                    path: self.path.clone(),
                    key: key.to_owned(),
                    first: self.options[first].name().to_owned(),
                    second: token.name().to_owned(),
                });
            }

            self.keys.insert(key.to_owned(), index);
        }

        self.options.push(token);
        Ok(())
    }

    fn add_group(&mut self, field: &Field, variants: &[Schema]) -> Result<(), SchemaError> {
        if let Some(ref existing) = self.subcommands {
            return Err(SchemaError::MultipleSubcommandGroups {
                path: self.path.clone(),
                first: existing.field.clone(),
                second: field.name().to_owned(),
            });
        }

        if let Requirement::Optional(_) = *field.requirement() {
            return Err(SchemaError::SubcommandDefault {
                path: self.path.clone(),
                field: field.name().to_owned(),
            });
        }

        if variants.is_empty() {
            return Err(SchemaError::EmptySubcommandGroup {
                path: self.path.clone(),
                field: field.name().to_owned(),
            });
        }

        let variants = variants
            .iter()
            .map(|variant| {
                let mut path = self.path.clone();
                path.push(variant.name().to_owned());
                compile_node(variant, path, self.settings)
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.subcommands = Some(SubcommandGroup {
            field: field.name().to_owned(),
            description: field.description().to_owned(),
            variants,
        });

        Ok(())
    }
}

fn compile_node(
    schema: &Schema,
    path: Vec<String>,
    settings: &Settings,
) -> Result<CommandNode, SchemaError> {
    tracing::debug!(command = %path.join(" "), fields = schema.fields().len(), "compiling command");

    let mut builder = NodeBuilder {
        path,
        settings,
        positionals: Vec::new(),
        options: Vec::new(),
        keys: HashMap::new(),
        shorts: HashMap::new(),
        subcommands: None,
    };

    let mut seen: Vec<&str> = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        if seen.contains(&field.name()) {
            return Err(SchemaError::DuplicateField {
                path: builder.path.clone(),
                field: field.name().to_owned(),
            });
        }
        seen.push(field.name());

        if field.allowed_values().is_some_and(<[String]>::is_empty) {
            return Err(SchemaError::EmptyChoices {
                path: builder.path.clone(),
                field: field.name().to_owned(),
            });
        }

        check_default(&builder.path, field)?;

        let keyed = match *field.shape() {
            Shape::Value(_) => !matches!(field.requirement(), Requirement::Required),
            Shape::Subcommand(_) => false,
            Shape::Flag | Shape::Collection(_) => true,
        };

        if let (false, Some(short)) = (keyed, field.short_alias()) {
            return Err(SchemaError::MisplacedShort {
                path: builder.path.clone(),
                field: field.name().to_owned(),
                short,
            });
        }

        builder.register_short(field)?;

        match *field.shape() {
            Shape::Flag => {
                let token = Token::new(descriptor(field, ValueType::Boolean), flag_kind(field));
                builder.add_option(token)?;
            }
            Shape::Collection(ty) => {
                let kind = TokenKind::Collection { keys: keys(field) };
                builder.add_option(Token::new(descriptor(field, ty), kind))?;
            }
            Shape::Value(ty) => match *field.requirement() {
                Requirement::Required => builder
                    .positionals
                    .push(Token::new(descriptor(field, ty), TokenKind::Positional)),
                Requirement::Optional(_) => {
                    let kind = TokenKind::Keyword { keys: keys(field) };
                    builder.add_option(Token::new(descriptor(field, ty), kind))?;
                }
            },
            Shape::Subcommand(ref variants) => builder.add_group(field, variants)?,
        }
    }

    Ok(CommandNode {
        name: schema.name().to_owned(),
        path: builder.path,
        description: schema.description().to_owned(),
        positionals: builder.positionals,
        options: builder.options,
        keys: builder.keys,
        subcommands: builder.subcommands,
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::schema::Field;

    fn greet() -> Schema {
        Schema::new("greet")
            .field(Field::value("name", ValueType::String))
            .field(Field::value("repeat", ValueType::Integer).default(10i64).short('r'))
            .field(Field::flag("verbose"))
            .field(Field::flag("quiet").default(false))
            .field(Field::flag("color").default(true))
    }

    #[test]
    fn fields_are_classified() {
        let node = compile(&greet()).unwrap();

        assert_eq!(node.positionals().len(), 1);
        assert_eq!(node.positionals()[0].kind(), &TokenKind::Positional);
        assert_eq!(node.options().len(), 4);
        assert_eq!(node.option_for("-r"), Some(0));
        assert_eq!(node.option_for("--repeat=4"), Some(0));
        assert_eq!(node.option_for("--name"), None);
    }

    #[test]
    fn flag_defaults_hide_the_redundant_spelling() {
        let node = compile(&greet()).unwrap();

        let spellings = |field: &str| node.token(field).unwrap().keys().collect::<Vec<_>>();

        assert_eq!(spellings("verbose"), ["--verbose", "--no-verbose"]);
        assert_eq!(spellings("quiet"), ["--quiet"]);
        assert_eq!(spellings("color"), ["--no-color"]);
    }

    #[test]
    fn compiling_twice_gives_the_same_tree() {
        let schema = Schema::new("git").field(Field::subcommand(
            "command",
            [
                Schema::new("clone").field(Field::value("repo", ValueType::String)),
                Schema::new("merge").field(Field::value("branch", ValueType::String)),
            ],
        ));

        let first = compile(&schema).unwrap();
        let second = compile(&schema).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.subcommands().unwrap().variants()[1].path(),
            ["git", "merge"]
        );
    }

    #[test]
    fn duplicate_short_alias() {
        let schema = Schema::new("tool")
            .field(Field::flag("verbose").short('v'))
            .field(Field::value("version", ValueType::String).default("1").short('v'));

        assert_eq!(
            compile(&schema),
            Err(SchemaError::DuplicateShort {
                path: Vec::from(["tool".to_owned()]),
                short: 'v',
                first: "verbose".into(),
                second: "version".into(),
            })
        );
    }

    #[test]
    fn short_alias_only_needs_to_be_unique_per_node() {
        let schema = Schema::new("tool")
            .field(Field::flag("verbose").short('v'))
            .field(Field::subcommand(
                "command",
                [Schema::new("run").field(Field::flag("version").short('v'))],
            ));

        assert!(compile(&schema).is_ok());
    }

    #[test]
    fn false_form_collides_with_field() {
        let schema = Schema::new("tool")
            .field(Field::flag("verbose"))
            .field(Field::flag("no_verbose").default(false));

        assert!(matches!(
            compile(&schema),
            Err(SchemaError::DuplicateKey { ref key, .. }) if key == "--no-verbose"
        ));
    }

    #[test]
    fn second_subcommand_group() {
        let schema = Schema::new("tool")
            .field(Field::subcommand("first", [Schema::new("a")]))
            .field(Field::subcommand("second", [Schema::new("b")]));

        assert!(matches!(
            compile(&schema),
            Err(SchemaError::MultipleSubcommandGroups { .. })
        ));
    }

    #[test]
    fn empty_subcommand_group() {
        let schema = Schema::new("tool").field(Field::subcommand("command", Vec::<Schema>::new()));

        assert!(matches!(
            compile(&schema),
            Err(SchemaError::EmptySubcommandGroup { .. })
        ));
    }

    #[test]
    fn help_keys_are_reserved() {
        let schema = Schema::new("tool").field(Field::flag("host").default(false).short('h'));

        assert!(matches!(
            compile(&schema),
            Err(SchemaError::ReservedKey { ref key, .. }) if key == "-h"
        ));

        let settings = Settings::new().help(false);
        assert!(compile_with(&schema, &settings).is_ok());
    }

    #[test]
    fn invalid_short_alias() {
        let schema = Schema::new("tool").field(Field::flag("dash").short('-'));

        assert!(matches!(
            compile(&schema),
            Err(SchemaError::InvalidShort { short: '-', .. })
        ));
    }

    #[test]
    fn empty_choices() {
        let schema = Schema::new("tool").field(Field::choice("mode", Vec::<String>::new()));

        assert!(matches!(
            compile(&schema),
            Err(SchemaError::EmptyChoices { .. })
        ));
    }

    #[rstest]
    #[case(Field::choice("style", ["compact", "pretty"]).default("ugly"), "ugly")]
    #[case(Field::value("width", ValueType::Integer).default("wide"), "wide")]
    #[case(Field::value("depth", ValueType::NonNegativeInteger).default(-1i64), "-1")]
    #[case(Field::flag("color").default("yes"), "yes")]
    #[case(Field::collection("tag", ValueType::Integer).default(Vec::from(["a"])), "[a]")]
    #[case(Field::collection("tag", ValueType::Integer).default(3i64), "3")]
    fn defaults_must_fit_their_field(#[case] field: Field, #[case] default: &str) {
        let schema = Schema::new("fmt").field(field);

        match compile(&schema) {
            Err(SchemaError::InvalidDefault {
                path,
                default: shown,
                ..
            }) => {
                assert_eq!(path, ["fmt"]);
                assert_eq!(shown, default);
            }
            other => panic!("expected an invalid default, got {other:?}"),
        }
    }

    #[test]
    fn fitting_defaults_are_accepted() {
        let schema = Schema::new("fmt")
            .field(Field::choice("style", ["compact", "pretty"]).default("pretty"))
            .field(Field::value("depth", ValueType::NonNegativeInteger).default(0i64))
            .field(Field::collection("tag", ValueType::String).default(Vec::from(["a", "b"])));

        assert!(compile(&schema).is_ok());
    }

    #[test]
    fn invalid_default_message() {
        let schema = Schema::new("fmt")
            .field(Field::choice("style", ["compact", "pretty"]).default("ugly"));

        assert_eq!(
            compile(&schema).unwrap_err().to_string(),
            "default `ugly` of field `style` in command `fmt` is not one of the allowed values `compact`, `pretty`: `ugly`"
        );
    }

    #[rstest]
    #[case(Schema::new("cp").field(Field::value("source", ValueType::Path).short('s')))]
    #[case(Schema::new("git").field(Field::subcommand("command", [Schema::new("status")]).short('c')))]
    fn short_aliases_need_a_key(#[case] schema: Schema) {
        assert!(matches!(
            compile(&schema),
            Err(SchemaError::MisplacedShort { .. })
        ));
    }
}
