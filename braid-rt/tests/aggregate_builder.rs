//! Builders of nested aggregates, written the way generated code uses the
//! runtime: one reference per aggregate-typed member.

use braid_rt::{
    Aggregate, BuildError, ListReference, MapReference, PersistentList, PersistentMap,
    PersistentSet, ReferenceState, ScalarReference, SetReference, UnionBuilder, UnionError,
    UnionVariants, require,
};
use itertools::Itertools;
use rstest::{fixture, rstest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Modifier {
    Public,
    Static,
    Final,
}

#[derive(Debug, Clone, PartialEq)]
struct Javadoc {
    lines: PersistentList<String>,
}

#[derive(Debug)]
struct JavadocBuilder {
    lines: ListReference<String>,
}

impl JavadocBuilder {
    fn add_line(&mut self, line: &str) -> &mut Self {
        self.lines.append(line.to_string());
        self
    }
}

impl Aggregate for Javadoc {
    type Builder = JavadocBuilder;
    type Error = BuildError;

    fn builder() -> JavadocBuilder {
        JavadocBuilder {
            lines: ListReference::for_list(),
        }
    }

    fn to_builder(&self) -> JavadocBuilder {
        JavadocBuilder {
            lines: ListReference::from_persistent_list(self.lines.clone()),
        }
    }

    fn build(builder: &mut JavadocBuilder) -> Result<Self, BuildError> {
        Ok(Self {
            lines: builder.lines.current_value(),
        })
    }
}

/// The underlying type of an enum: a plain name, or a list of bounds.
#[derive(Debug, Clone, PartialEq)]
enum Underlying {
    Named(String),
    Bounds(PersistentList<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnderlyingTag {
    Named,
    Bounds,
}

enum UnderlyingVariant {
    Named(String),
    Bounds(ListReference<String>),
}

impl UnionVariants for UnderlyingVariant {
    type Tag = UnderlyingTag;
    type Persistent = Underlying;
    type Error = SyntaxError;

    fn tag(&self) -> UnderlyingTag {
        match self {
            Self::Named(_) => UnderlyingTag::Named,
            Self::Bounds(_) => UnderlyingTag::Bounds,
        }
    }

    fn seed(value: &Underlying) -> Self {
        match value {
            Underlying::Named(name) => Self::Named(name.clone()),
            Underlying::Bounds(bounds) => {
                Self::Bounds(ListReference::from_persistent_list(bounds.clone()))
            }
        }
    }

    fn empty_reference(tag: UnderlyingTag) -> Option<Self> {
        match tag {
            UnderlyingTag::Named => None,
            UnderlyingTag::Bounds => Some(Self::Bounds(ListReference::for_list())),
        }
    }

    fn freeze(&mut self) -> Result<Underlying, SyntaxError> {
        Ok(match self {
            Self::Named(name) => Underlying::Named(name.clone()),
            Self::Bounds(bounds) => Underlying::Bounds(bounds.current_value()),
        })
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
enum SyntaxError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("underlying type: {0}")]
    Underlying(#[from] UnionError<UnderlyingTag>),
}

#[derive(Debug, Clone, PartialEq)]
struct EnumSyntax {
    name: String,
    javadoc: Option<Javadoc>,
    modifiers: PersistentSet<Modifier>,
    constants: PersistentList<String>,
    annotations: PersistentMap<String, String>,
    underlying: Underlying,
}

struct EnumSyntaxBuilder {
    name: Option<String>,
    javadoc: Option<ScalarReference<Javadoc>>,
    modifiers: SetReference<Modifier>,
    constants: ListReference<String>,
    annotations: MapReference<String, String>,
    underlying: UnionBuilder<UnderlyingVariant>,
}

impl EnumSyntaxBuilder {
    fn name(&mut self, name: &str) -> &mut Self {
        self.name = Some(name.to_string());
        self
    }

    fn javadoc(&mut self, javadoc: Javadoc) -> &mut Self {
        if let Some(reference) = &mut self.javadoc {
            reference.set_persistent(javadoc);
        } else {
            self.javadoc = Some(ScalarReference::from_aggregate(javadoc));
        }
        self
    }

    fn javadoc_mut(&mut self) -> &mut JavadocBuilder {
        let reference = self
            .javadoc
            .get_or_insert_with(ScalarReference::for_aggregate);
        reference
            .as_mutable()
            .expect("javadoc builders always materialize")
    }

    fn add_modifier(&mut self, modifier: Modifier) -> &mut Self {
        self.modifiers.append(modifier);
        self
    }

    fn modifiers(&mut self, modifiers: impl IntoIterator<Item = Modifier>) -> &mut Self {
        self.modifiers.replace_all(modifiers);
        self
    }

    fn add_constant(&mut self, constant: &str) -> &mut Self {
        self.constants.append(constant.to_string());
        self
    }

    fn put_annotation(&mut self, key: &str, value: &str) -> &mut Self {
        self.annotations.associate(key.to_string(), value.to_string());
        self
    }

    fn underlying_name(&mut self, name: &str) -> &mut Self {
        self.underlying
            .set(UnderlyingVariant::Named(name.to_string()));
        self
    }

    fn add_bound(&mut self, bound: &str) -> &mut Self {
        self.underlying
            .select(UnderlyingTag::Bounds, |variant| match variant {
                UnderlyingVariant::Bounds(bounds) => Some(bounds),
                UnderlyingVariant::Named(_) => None,
            })
            .expect("bounds are reference-backed")
            .append(bound.to_string());
        self
    }
}

impl Aggregate for EnumSyntax {
    type Builder = EnumSyntaxBuilder;
    type Error = SyntaxError;

    fn builder() -> EnumSyntaxBuilder {
        EnumSyntaxBuilder {
            name: None,
            javadoc: None,
            modifiers: SetReference::for_ordered_set(),
            constants: ListReference::for_list(),
            annotations: MapReference::for_map(),
            underlying: UnionBuilder::new(),
        }
    }

    fn to_builder(&self) -> EnumSyntaxBuilder {
        EnumSyntaxBuilder {
            name: Some(self.name.clone()),
            javadoc: self.javadoc.clone().map(ScalarReference::from_aggregate),
            modifiers: SetReference::from_persistent_ordered_set(self.modifiers.clone()),
            constants: ListReference::from_persistent_list(self.constants.clone()),
            annotations: MapReference::from_persistent_map(self.annotations.clone()),
            underlying: UnionBuilder::from_persistent(&self.underlying),
        }
    }

    fn build(builder: &mut EnumSyntaxBuilder) -> Result<Self, SyntaxError> {
        Ok(Self {
            name: require(builder.name.clone(), "EnumSyntax", "name")?,
            javadoc: builder
                .javadoc
                .as_mut()
                .map(|javadoc| javadoc.current_value())
                .transpose()?,
            modifiers: builder.modifiers.current_value(),
            constants: builder.constants.current_value(),
            annotations: builder.annotations.current_value(),
            underlying: builder.underlying.build()?,
        })
    }
}

#[fixture]
fn color() -> EnumSyntax {
    let mut builder = EnumSyntax::builder();
    builder
        .name("Color")
        .add_modifier(Modifier::Public)
        .add_modifier(Modifier::Final)
        .add_constant("RED")
        .add_constant("GREEN")
        .put_annotation("since", "1.0")
        .underlying_name("int");
    builder.javadoc_mut().add_line("Primary colors.");
    EnumSyntax::build(&mut builder).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

#[rstest]
fn fresh_builder_collects_members(color: EnumSyntax) {
    assert_eq!(color.name, "Color");
    assert_eq!(
        color.modifiers.iter().copied().collect_vec(),
        [Modifier::Public, Modifier::Final]
    );
    assert_eq!(color.constants.as_slice(), ["RED", "GREEN"]);
    assert_eq!(color.annotations.get(&"since".to_string()).map(String::as_str), Some("1.0"));
    assert_eq!(color.underlying, Underlying::Named("int".to_string()));
    let javadoc = color.javadoc.as_ref().unwrap();
    assert_eq!(javadoc.lines.as_slice(), ["Primary colors."]);
}

#[rstest]
fn untouched_members_are_shared(color: EnumSyntax) {
    init_tracing();
    let mut builder = color.to_builder();
    builder.name("Colour");
    let renamed = EnumSyntax::build(&mut builder).unwrap();

    assert_eq!(renamed.name, "Colour");
    assert!(renamed.modifiers.ptr_eq(&color.modifiers));
    assert!(renamed.constants.ptr_eq(&color.constants));
    assert!(renamed.annotations.ptr_eq(&color.annotations));
    let (before, after) = (color.javadoc.unwrap(), renamed.javadoc.unwrap());
    assert!(after.lines.ptr_eq(&before.lines));
    assert_eq!(builder.constants.state(), ReferenceState::Persistent);
}

#[rstest]
fn edits_leave_original_untouched(color: EnumSyntax) {
    init_tracing();
    let mut builder = color.to_builder();
    builder
        .add_constant("BLUE")
        .add_modifier(Modifier::Public)
        .add_modifier(Modifier::Static);
    builder.javadoc_mut().add_line("Now with blue.");
    let edited = EnumSyntax::build(&mut builder).unwrap();

    assert_eq!(edited.constants.as_slice(), ["RED", "GREEN", "BLUE"]);
    assert_eq!(
        edited.modifiers.iter().copied().collect_vec(),
        [Modifier::Public, Modifier::Final, Modifier::Static]
    );
    assert_eq!(
        edited.javadoc.unwrap().lines.as_slice(),
        ["Primary colors.", "Now with blue."]
    );
    // The annotations were never touched.
    assert!(edited.annotations.ptr_eq(&color.annotations));

    assert_eq!(color.constants.as_slice(), ["RED", "GREEN"]);
    assert_eq!(color.modifiers.len(), 2);
    assert_eq!(color.javadoc.unwrap().lines.len(), 1);
}

#[rstest]
fn repeated_builds_reuse_frozen_members(color: EnumSyntax) {
    let mut builder = color.to_builder();
    builder.add_constant("BLUE");
    let first = EnumSyntax::build(&mut builder).unwrap();
    let second = EnumSyntax::build(&mut builder).unwrap();
    assert!(first.constants.ptr_eq(&second.constants));
    assert_eq!(first, second);

    builder.add_constant("CYAN");
    let third = EnumSyntax::build(&mut builder).unwrap();
    assert!(!third.constants.ptr_eq(&second.constants));
    assert_eq!(second.constants.len(), 3);
    assert_eq!(third.constants.len(), 4);
}

#[rstest]
fn setters_replace_members(color: EnumSyntax) {
    let mut builder = color.to_builder();
    builder.add_constant("BLUE");
    builder.constants.set_persistent(PersistentList::from(vec!["ONLY".to_string()]));
    builder.modifiers([Modifier::Static]);
    builder.javadoc(Javadoc {
        lines: PersistentList::default(),
    });
    let replaced = EnumSyntax::build(&mut builder).unwrap();

    assert_eq!(replaced.constants.as_slice(), ["ONLY"]);
    assert_eq!(
        replaced.modifiers.iter().copied().collect_vec(),
        [Modifier::Static]
    );
    assert!(replaced.modifiers.is_ordered());
    assert!(replaced.javadoc.unwrap().lines.is_empty());
}

#[rstest]
fn union_member_switches_variant(color: EnumSyntax) {
    let mut builder = color.to_builder();
    builder.add_bound("Comparable").add_bound("Serializable");
    let bounded = EnumSyntax::build(&mut builder).unwrap();
    assert_eq!(
        bounded.underlying,
        Underlying::Bounds(PersistentList::from(vec![
            "Comparable".to_string(),
            "Serializable".to_string()
        ]))
    );
    assert_eq!(color.underlying, Underlying::Named("int".to_string()));

    builder.underlying_name("long");
    let named = EnumSyntax::build(&mut builder).unwrap();
    assert_eq!(named.underlying, Underlying::Named("long".to_string()));
}

#[test]
fn missing_members_fail_to_build() {
    let mut builder = EnumSyntax::builder();
    builder.add_constant("A");
    let err = EnumSyntax::build(&mut builder).unwrap_err();
    assert_eq!(err.to_string(), "EnumSyntax is missing required member `name`");

    builder.name("Letters");
    let err = EnumSyntax::build(&mut builder).unwrap_err();
    assert_eq!(err, SyntaxError::Underlying(UnionError::Unset));
    assert_eq!(err.to_string(), "underlying type: no union variant was set");

    builder.underlying_name("char");
    assert_eq!(EnumSyntax::build(&mut builder).unwrap().constants.as_slice(), ["A"]);
}
