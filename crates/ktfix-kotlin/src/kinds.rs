//! Mapping of grammar node names to [`NodeKind`].

use ktfix_core::NodeKind;

/// Grammar nodes whose children are attached to the parent directly.
///
/// Keeps members of a class body and statements of a block as direct
/// children of the body or block.
const TRANSPARENT: &[&str] = &["class_member_declarations", "statements"];

/// Returns true if the node is dissolved into its parent.
pub(crate) fn is_transparent(grammar_kind: &str) -> bool {
    TRANSPARENT.contains(&grammar_kind)
}

/// Returns the category of a grammar node.
///
/// Unnamed tokens are keywords when they start with a letter and
/// punctuation otherwise.
pub(crate) fn node_kind(grammar_kind: &str, named: bool) -> NodeKind {
    if !named {
        return if grammar_kind.starts_with(|c: char| c.is_ascii_alphabetic()) {
            NodeKind::Keyword
        } else {
            NodeKind::Punctuation
        };
    }
    match grammar_kind {
        "source_file" | "script" => NodeKind::File,
        "package_header" => NodeKind::PackageHeader,
        "import" | "import_header" => NodeKind::Import,
        "class_declaration" => NodeKind::ClassDeclaration,
        "object_declaration" | "companion_object" => NodeKind::ObjectDeclaration,
        "function_declaration" => NodeKind::FunctionDeclaration,
        "property_declaration" => NodeKind::PropertyDeclaration,
        "class_body" | "enum_class_body" => NodeKind::ClassBody,
        "block" => NodeKind::Block,
        "modifiers" => NodeKind::Modifiers,
        "annotation" => NodeKind::Annotation,
        "file_annotation" => NodeKind::FileAnnotation,
        "visibility_modifier" => NodeKind::VisibilityModifier,
        "identifier" | "simple_identifier" | "type_identifier" => NodeKind::Identifier,
        "string_literal" | "multiline_string_literal" => NodeKind::StringLiteral,
        "string_content" => NodeKind::StringContent,
        "line_comment" => NodeKind::LineComment,
        "block_comment" | "multiline_comment" => NodeKind::BlockComment,
        "ERROR" => NodeKind::Error,
        _ => NodeKind::Other,
    }
}
