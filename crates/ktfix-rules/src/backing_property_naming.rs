//! Rule for the naming and visibility of backing properties.
//!
//! # Rationale
//!
//! A property whose name starts with an underscore backs a public property
//! or getter of the same name:
//!
//! ```kotlin
//! class Foo {
//!     private val _elementList = mutableListOf<Element>()
//!     val elementList: List<Element>
//!         get() = _elementList
//! }
//! ```
//!
//! The backing property is private (or lives in a private companion
//! object), is named in lower camel case after the underscore, and has a
//! public counterpart: a property of the same name or a `get<Name>()`
//! function without parameters.
//!
//! # Configuration
//!
//! - `code_style`: with `android_studio` the counterpart may have any
//!   visibility.
//!
//! Overridden properties are not checked. Nothing is fixed automatically.

use crate::util::{declaration_name, has_modifier};
use ktfix_core::config::CODE_STYLE;
use ktfix_core::{
    CodeStyle, NodeId, NodeKind, Rule, RuleContext, RuleDescriptor, RuleError, RuleId,
    RuleProvider, Tree,
};

/// Rule name for backing-property-naming.
pub const NAME: &str = "backing-property-naming";

const LOWER_CAMEL_CASE: &str = "Backing property should start with underscore followed by lower camel case";
const NOT_PRIVATE: &str = "Backing property not allowed when 'private' modifier is missing";
const NO_COUNTERPART: &str = "Backing property is only allowed when a matching property or function exists";
const COUNTERPART_NOT_PUBLIC: &str =
    "Backing property is only allowed when the matching property or function is public";

/// Returns the id of the rule.
#[must_use]
pub fn rule_id() -> RuleId {
    RuleId::standard(NAME)
}

/// Returns the provider of the rule.
#[must_use]
pub fn provider() -> RuleProvider {
    RuleProvider::new(
        RuleDescriptor::new(rule_id())
            .with_description("Backing properties are private and match a public property or getter")
            .with_property(&CODE_STYLE),
        || Box::new(BackingPropertyNaming::new()),
    )
}

/// Checks properties whose name starts with an underscore.
#[derive(Debug, Clone, Default)]
pub struct BackingPropertyNaming;

impl BackingPropertyNaming {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn is_lower_camel_case(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next() == Some('_')
        && chars.next().is_some_and(char::is_lowercase)
        && chars.all(char::is_alphanumeric)
}

fn is_public(tree: &Tree, declaration: NodeId) -> bool {
    !["private", "protected", "internal"]
        .iter()
        .any(|word| has_modifier(tree, declaration, word))
}

fn is_companion(tree: &Tree, declaration: NodeId) -> bool {
    tree.kind(declaration) == NodeKind::ObjectDeclaration
        && (tree.grammar_kind(declaration) == "companion_object"
            || tree
                .children(declaration)
                .iter()
                .any(|&c| tree.leaf_text(c) == Some("companion"))
            || has_modifier(tree, declaration, "companion"))
}

/// Returns the companion object owning a class body.
fn companion_of(tree: &Tree, body: NodeId) -> Option<NodeId> {
    tree.parent(body).filter(|&p| is_companion(tree, p))
}

fn has_name(tree: &Tree, declaration: NodeId, name: &str) -> bool {
    declaration_name(tree, declaration).and_then(|n| tree.leaf_text(n)) == Some(name)
}

fn find_property(tree: &Tree, body: NodeId, name: &str) -> Option<NodeId> {
    tree.children(body).iter().copied().find(|&c| {
        tree.kind(c) == NodeKind::PropertyDeclaration && has_name(tree, c, name)
    })
}

fn has_no_parameters(tree: &Tree, function: NodeId) -> bool {
    tree.children(function)
        .iter()
        .find(|&&c| tree.grammar_kind(c) == "function_value_parameters")
        .is_some_and(|&parameters| {
            tree.children(parameters)
                .iter()
                .all(|&c| tree.kind(c) == NodeKind::Punctuation || tree.kind(c).is_trivia())
        })
}

fn find_getter(tree: &Tree, body: NodeId, name: &str) -> Option<NodeId> {
    tree.children(body).iter().copied().find(|&c| {
        tree.kind(c) == NodeKind::FunctionDeclaration
            && has_name(tree, c, name)
            && has_no_parameters(tree, c)
    })
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

/// Finds the property or getter backed by `property`, looking in the
/// enclosing class body and, for a companion object, in the body around it.
fn find_counterpart(tree: &Tree, property: NodeId, name: &str) -> Option<NodeId> {
    let body = tree.find_ancestor(property, |k| k == NodeKind::ClassBody)?;
    let outer = companion_of(tree, body)
        .and_then(|companion| tree.find_ancestor(companion, |k| k == NodeKind::ClassBody));
    let getter = format!("get{}", capitalize(name));

    find_property(tree, body, name)
        .or_else(|| outer.and_then(|o| find_property(tree, o, name)))
        .or_else(|| find_getter(tree, body, &getter))
        .or_else(|| outer.and_then(|o| find_getter(tree, o, &getter)))
}

fn in_private_companion(tree: &Tree, property: NodeId) -> bool {
    tree.parent(property)
        .filter(|&p| tree.kind(p) == NodeKind::ClassBody)
        .and_then(|body| companion_of(tree, body))
        .is_some_and(|companion| has_modifier(tree, companion, "private"))
}

impl Rule for BackingPropertyNaming {
    fn visit(&mut self, node: NodeId, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let tree = ctx.tree();
        if tree.kind(node) != NodeKind::PropertyDeclaration || has_modifier(tree, node, "override") {
            return Ok(());
        }
        let Some(identifier) = declaration_name(tree, node) else {
            return Ok(());
        };
        let Some(name) = tree.leaf_text(identifier).filter(|n| n.starts_with('_')) else {
            return Ok(());
        };

        let mut messages = Vec::new();
        if !is_lower_camel_case(name) {
            messages.push(LOWER_CAMEL_CASE);
        }
        if !has_modifier(tree, node, "private") && !in_private_companion(tree, node) {
            messages.push(NOT_PRIVATE);
        }
        match find_counterpart(tree, node, &name[1..]) {
            None => messages.push(NO_COUNTERPART),
            Some(counterpart) => {
                if !is_public(tree, counterpart)
                    && ctx.config().code_style_at(node)? != CodeStyle::AndroidStudio
                {
                    messages.push(COUNTERPART_NOT_PUBLIC);
                }
            }
        }

        let offset = tree.offset(identifier);
        for message in messages {
            ctx.emit(offset, message, false);
        }
        Ok(())
    }
}
