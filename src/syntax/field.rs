//! Field tags for child access
//!
//! The parser labels selected children with a field tag so consumers can
//! navigate structurally (`child_by_field`) instead of scanning by kind.

/// Field names attached to children of composite nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Alias,
    ClassDefinition,
    ClassPrefixes,
    ClassSpecifier,
    ComponentClause,
    ComponentDeclarations,
    Declaration,
    DescriptionString,
    EndIdentifier,
    Global,
    Identifier,
    Imports,
    Indices,
    Modification,
    Name,
    Qualifier,
    TypeSpecifier,
    TypePrefix,
    Value,
    Wildcard,
}

impl Field {
    /// The grammar-facing label of this field, e.g. `classSpecifier`.
    pub fn name(self) -> &'static str {
        match self {
            Field::Alias => "alias",
            Field::ClassDefinition => "classDefinition",
            Field::ClassPrefixes => "classPrefixes",
            Field::ClassSpecifier => "classSpecifier",
            Field::ComponentClause => "componentClause",
            Field::ComponentDeclarations => "componentDeclarations",
            Field::Declaration => "declaration",
            Field::DescriptionString => "descriptionString",
            Field::EndIdentifier => "endIdentifier",
            Field::Global => "global",
            Field::Identifier => "identifier",
            Field::Imports => "imports",
            Field::Indices => "indices",
            Field::Modification => "modification",
            Field::Name => "name",
            Field::Qualifier => "qualifier",
            Field::TypeSpecifier => "typeSpecifier",
            Field::TypePrefix => "typePrefix",
            Field::Value => "value",
            Field::Wildcard => "wildcard",
        }
    }
}
