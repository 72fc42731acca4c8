//! Rule table for entity detection
//!
//! Rules are declared in TOML (`patterns/redaction_rules.toml` is embedded as
//! the default) and compiled once into a [`PatternRegistry`]. Each `[[rule]]`
//! names an entity label and a priority rank; lower ranks win overlapping
//! spans in the resolver. `[[structural]]` records register the ranks of the
//! recognizers that are code rather than a single expression (person names),
//! so that the whole precedence order lives in one table.

use crate::anonymization::detector::validators::Validator;
use crate::anonymization::models::{CandidateSpan, EntityType};
use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Default look-behind window for context and exclusion checks, in characters
pub const DEFAULT_WINDOW: usize = 48;

/// Rule definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDefinition {
    pub name: String,
    /// Entity type label (e.g. `BIRTH_ID`)
    pub entity: String,
    pub priority: u32,
    /// Value expression (fancy-regex syntax)
    pub pattern: String,
    /// Capture group holding the value
    #[serde(default)]
    pub group: usize,
    /// Required label immediately before the match
    #[serde(default)]
    pub context: Option<String>,
    /// Required text immediately after the value
    #[serde(default)]
    pub context_after: Option<String>,
    #[serde(default)]
    pub exclude_before: Vec<String>,
    #[serde(default)]
    pub exclude_after: Vec<String>,
    #[serde(default)]
    pub validator: Option<String>,
    #[serde(default)]
    pub window: Option<usize>,
    #[serde(default)]
    pub ignore_case: bool,
    /// Also run over the tagged text during the end-scan
    #[serde(default)]
    pub end_scan: bool,
    /// Skip the primary pass; the rule only sweeps what is left untagged
    #[serde(default)]
    pub end_scan_only: bool,
}

/// Precedence record for a code-based recognizer
#[derive(Debug, Clone, Deserialize)]
pub struct StructuralDefinition {
    pub name: String,
    pub entity: String,
    pub priority: u32,
    #[serde(default)]
    pub contextual: bool,
}

#[derive(Debug, Deserialize)]
struct RuleTable {
    #[serde(default, rename = "rule")]
    rules: Vec<RuleDefinition>,
    #[serde(default, rename = "structural")]
    structural: Vec<StructuralDefinition>,
}

/// Compiled rule with its context checks
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub entity_type: EntityType,
    pub priority: u32,
    pub end_scan: bool,
    pub end_scan_only: bool,
    pattern: fancy_regex::Regex,
    group: usize,
    context: Option<Regex>,
    context_after: Option<Regex>,
    exclude_before: Option<Regex>,
    exclude_after: Option<Regex>,
    validator: Option<Validator>,
    window: usize,
}

/// Precedence entry for a structural recognizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralRule {
    pub name: String,
    pub entity_type: EntityType,
    pub priority: u32,
    pub contextual: bool,
}

impl CompiledRule {
    fn compile(def: &RuleDefinition) -> Result<Self> {
        let entity_type = EntityType::from_label(&def.entity)
            .with_context(|| format!("Unknown entity label in rule '{}': {}", def.name, def.entity))?;
        if def.end_scan_only && !def.end_scan {
            bail!("Rule '{}' is end_scan_only but not flagged end_scan", def.name);
        }

        let source = if def.ignore_case {
            format!("(?i){}", def.pattern)
        } else {
            def.pattern.clone()
        };
        let pattern = fancy_regex::Regex::new(&source)
            .with_context(|| format!("Invalid pattern in rule '{}': {}", def.name, def.pattern))?;

        let context = def
            .context
            .as_deref()
            .map(|ctx| compile_aux(&def.name, &format!(r"(?i)(?:{ctx})[\s:=\-–.#]*$")))
            .transpose()?;
        let context_after = def
            .context_after
            .as_deref()
            .map(|ctx| compile_aux(&def.name, &format!(r"(?i)^\s*(?:{ctx})")))
            .transpose()?;
        let exclude_before = alternation(&def.exclude_before)
            .map(|alt| compile_aux(&def.name, &format!(r"(?i)(?:{alt})\s*$")))
            .transpose()?;
        let exclude_after = alternation(&def.exclude_after)
            .map(|alt| compile_aux(&def.name, &format!(r"(?i)^\s*(?:{alt})")))
            .transpose()?;

        let validator = def
            .validator
            .as_deref()
            .map(|v| {
                v.parse::<Validator>()
                    .map_err(|e| anyhow::anyhow!("Rule '{}': {e}", def.name))
            })
            .transpose()?;

        Ok(Self {
            name: def.name.clone(),
            entity_type,
            priority: def.priority,
            end_scan: def.end_scan,
            end_scan_only: def.end_scan_only,
            pattern,
            group: def.group,
            context,
            context_after,
            exclude_before,
            exclude_after,
            validator,
            window: def.window.unwrap_or(DEFAULT_WINDOW).max(1),
        })
    }

    /// Whether the rule only fires next to a label
    pub fn is_contextual(&self) -> bool {
        self.context.is_some() || self.context_after.is_some()
    }

    /// All value spans of this rule in `text`.
    ///
    /// A match rejected by its context, exclusions or validator does not
    /// consume its text: the search resumes one character after its start.
    pub fn find(&self, text: &str) -> Result<Vec<CandidateSpan>> {
        let mut spans = Vec::new();
        let mut pos = 0;

        while pos <= text.len() {
            let caps = self
                .pattern
                .captures_from_pos(text, pos)
                .with_context(|| format!("Pattern evaluation failed in rule '{}'", self.name))?;
            let Some(caps) = caps else {
                break;
            };
            let Some(whole) = caps.get(0) else {
                break;
            };

            let accepted = caps
                .get(self.group)
                .filter(|value| self.accepts(text, whole.start(), value.start(), value.end()));

            match accepted {
                Some(value) => {
                    spans.push(
                        CandidateSpan::new(
                            value.start(),
                            value.end(),
                            self.entity_type,
                            value.as_str(),
                            self.priority,
                            self.name.as_str(),
                        )
                        .with_context(self.is_contextual()),
                    );
                    pos = if whole.end() > whole.start() {
                        whole.end()
                    } else {
                        next_boundary(text, whole.end())
                    };
                }
                None => pos = next_boundary(text, whole.start()),
            }
        }

        Ok(spans)
    }

    fn accepts(&self, text: &str, match_start: usize, start: usize, end: usize) -> bool {
        let value = &text[start..end];
        if value.trim().is_empty() {
            return false;
        }

        if let Some(ctx) = &self.context {
            if !ctx.is_match(window_before(text, match_start, self.window)) {
                return false;
            }
        }
        if let Some(ex) = &self.exclude_before {
            if ex.is_match(window_before(text, start, self.window)) {
                return false;
            }
        }

        let after = window_after(text, end, self.window);
        if let Some(ctx) = &self.context_after {
            if !ctx.is_match(after) {
                return false;
            }
        }
        if let Some(ex) = &self.exclude_after {
            if ex.is_match(after) {
                return false;
            }
        }

        self.validator.map_or(true, |v| v.check(value))
    }
}

/// Byte offset of the character after the one at `pos`
fn next_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| pos + c.len_utf8())
}

fn compile_aux(rule: &str, source: &str) -> Result<Regex> {
    Regex::new(source).with_context(|| format!("Invalid context expression in rule '{rule}': {source}"))
}

fn alternation(parts: &[String]) -> Option<String> {
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("|"))
    }
}

/// Up to `chars` characters ending at byte offset `end`
fn window_before(text: &str, end: usize, chars: usize) -> &str {
    let head = &text[..end];
    let start = head
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &head[start..]
}

/// Up to `chars` characters starting at byte offset `start`
fn window_after(text: &str, start: usize, chars: usize) -> &str {
    let tail = &text[start..];
    let end = tail
        .char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(tail.len());
    &tail[..end]
}

/// Compiled rule table
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    rules: Vec<CompiledRule>,
    structural: HashMap<String, StructuralRule>,
}

impl PatternRegistry {
    /// Load a rule table from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read pattern library: {}", path.as_ref().display())
        })?;

        Self::from_toml(&content)
    }

    /// Compile and validate a rule table
    pub fn from_toml(content: &str) -> Result<Self> {
        let table: RuleTable =
            toml::from_str(content).context("Failed to parse pattern library TOML")?;

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(table.rules.len());
        for def in &table.rules {
            if !seen.insert(def.name.clone()) {
                bail!("Duplicate rule name: {}", def.name);
            }
            rules.push(CompiledRule::compile(def)?);
        }

        let mut structural = HashMap::new();
        for def in &table.structural {
            if !seen.insert(def.name.clone()) {
                bail!("Duplicate rule name: {}", def.name);
            }
            let entity_type = EntityType::from_label(&def.entity).with_context(|| {
                format!("Unknown entity label in structural rule '{}': {}", def.name, def.entity)
            })?;
            structural.insert(
                def.name.clone(),
                StructuralRule {
                    name: def.name.clone(),
                    entity_type,
                    priority: def.priority,
                    contextual: def.contextual,
                },
            );
        }

        let registry = Self { rules, structural };
        registry.check_precedence()?;
        Ok(registry)
    }

    /// Built-in Czech rule table
    pub fn default_rules() -> Result<Self> {
        let default_toml = include_str!("../../../../patterns/redaction_rules.toml");
        Self::from_toml(default_toml)
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Rules run over raw text in the primary pass
    pub fn primary_rules(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter().filter(|r| !r.end_scan_only)
    }

    /// Rules flagged for the end-scan pass
    pub fn end_scan_rules(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter().filter(|r| r.end_scan)
    }

    pub fn rule(&self, name: &str) -> Option<&CompiledRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn structural(&self, name: &str) -> Option<&StructuralRule> {
        self.structural.get(name)
    }

    /// A context-bearing rule must rank ahead of every context-free rule
    /// of the same entity type.
    fn check_precedence(&self) -> Result<()> {
        let entries = self
            .rules
            .iter()
            .map(|r| (r.name.as_str(), r.entity_type, r.priority, r.is_contextual()))
            .chain(
                self.structural
                    .values()
                    .map(|s| (s.name.as_str(), s.entity_type, s.priority, s.contextual)),
            )
            .collect::<Vec<_>>();

        for &(ctx_name, ctx_type, ctx_priority, contextual) in &entries {
            if !contextual {
                continue;
            }
            for &(name, entity_type, priority, other_contextual) in &entries {
                if !other_contextual && entity_type == ctx_type && priority <= ctx_priority {
                    bail!(
                        "Context-free rule '{name}' (priority {priority}) outranks contextual rule \
                         '{ctx_name}' (priority {ctx_priority}) for {ctx_type}"
                    );
                }
            }
        }
        Ok(())
    }
}
