//! Template conditionals.
//!
//! Two block directives gate content on feature state:
//!
//! ```text
//! @feature('dark-mode') … @endfeature
//! @featurefor('beta', user) … @endfeaturefor
//! ```
//!
//! `@featurefor` takes the name of a binding supplied in the
//! [`RenderContext`]. Blocks nest. Each distinct condition is resolved once
//! per render; nothing is cached between renders. Any error, including an
//! unknown feature, fails the whole render.

mod lexer;
mod render;

use featuregate_domain::{validate_feature_name, FeatureGateError, Result};

use self::lexer::{Keyword, Token};
pub use self::render::RenderContext;

/// Condition guarding a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Condition {
    /// Global state of the feature.
    Global(String),
    /// Effective state of the feature for the entity bound to `binding`.
    For { feature: String, binding: String },
}

impl Condition {
    pub fn feature(&self) -> &str {
        match self {
            Self::Global(feature) | Self::For { feature, .. } => feature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Block { condition: Condition, body: Vec<Node> },
}

/// A feature name found in template source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureReference {
    pub feature: String,
    pub binding: Option<String>,
    pub line: usize,
}

/// List every feature referenced by an opening directive.
///
/// Works on malformed templates too (unbalanced blocks, bad names) and on
/// host-language bindings such as `$user`, so audit tooling can report what
/// it sees. The binding is the second argument as written.
pub fn scan_references(source: &str) -> Vec<FeatureReference> {
    lexer::references(source)
        .into_iter()
        .map(|reference| FeatureReference {
            feature: reference.name.to_string(),
            binding: reference.binding.map(str::to_string),
            line: reference.line,
        })
        .collect()
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

struct OpenBlock {
    keyword: Keyword,
    condition: Condition,
    line: usize,
    body: Vec<Node>,
}

impl Template {
    /// Parse template source into a block tree.
    ///
    /// # Errors
    /// `Validation` for unbalanced or mismatched directives, invalid feature
    /// names, a `@featurefor` without a binding or a `@feature` with one.
    pub fn parse(source: &str) -> Result<Self> {
        let mut root: Vec<Node> = Vec::new();
        let mut stack: Vec<OpenBlock> = Vec::new();

        for token in lexer::tokenize(source) {
            match token {
                Token::Text(text) => {
                    let target = stack.last_mut().map_or(&mut root, |open| &mut open.body);
                    target.push(Node::Text(text.to_string()));
                }
                Token::Directive { keyword, name, binding, line } => match keyword {
                    Keyword::Feature | Keyword::FeatureFor => {
                        let condition = opening_condition(keyword, name, binding, line)?;
                        stack.push(OpenBlock { keyword, condition, line, body: Vec::new() });
                    }
                    Keyword::EndFeature | Keyword::EndFeatureFor => {
                        if name.is_some() || binding.is_some() {
                            return Err(template_error(
                                line,
                                format!("`{}` takes no arguments", keyword.as_str()),
                            ));
                        }
                        let open = stack.pop().ok_or_else(|| {
                            template_error(line, format!("`{}` has no opening block", keyword.as_str()))
                        })?;
                        if closing_for(open.keyword) != keyword {
                            return Err(template_error(
                                line,
                                format!(
                                    "`{}` closes `{}` opened on line {}",
                                    keyword.as_str(),
                                    open.keyword.as_str(),
                                    open.line
                                ),
                            ));
                        }
                        let block = Node::Block { condition: open.condition, body: open.body };
                        let target = stack.last_mut().map_or(&mut root, |parent| &mut parent.body);
                        target.push(block);
                    }
                },
            }
        }

        if let Some(open) = stack.pop() {
            return Err(template_error(
                open.line,
                format!("`{}` is never closed", open.keyword.as_str()),
            ));
        }

        Ok(Self { nodes: root })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Distinct conditions in the template, in first-seen order.
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut seen: Vec<&Condition> = Vec::new();
        collect_conditions(&self.nodes, &mut seen);
        seen
    }
}

fn collect_conditions<'t>(nodes: &'t [Node], seen: &mut Vec<&'t Condition>) {
    for node in nodes {
        if let Node::Block { condition, body } = node {
            if !seen.contains(&condition) {
                seen.push(condition);
            }
            collect_conditions(body, seen);
        }
    }
}

fn opening_condition(
    keyword: Keyword,
    name: Option<&str>,
    binding: Option<&str>,
    line: usize,
) -> Result<Condition> {
    let feature = name.unwrap_or_default();
    validate_feature_name(feature)
        .map_err(|err| template_error(line, format!("`{}`: {err}", keyword.as_str())))?;

    match (keyword, binding) {
        (Keyword::Feature, None) => Ok(Condition::Global(feature.to_string())),
        (Keyword::Feature, Some(_)) => Err(template_error(
            line,
            "`@feature` takes only a name; use `@featurefor` for an entity".into(),
        )),
        (_, Some(binding)) => {
            Ok(Condition::For { feature: feature.to_string(), binding: binding.to_string() })
        }
        (_, None) => Err(template_error(line, "`@featurefor` requires a binding".into())),
    }
}

fn closing_for(opening: Keyword) -> Keyword {
    match opening {
        Keyword::FeatureFor => Keyword::EndFeatureFor,
        _ => Keyword::EndFeature,
    }
}

fn template_error(line: usize, message: String) -> FeatureGateError {
    FeatureGateError::Validation(format!("template line {line}: {message}"))
}
