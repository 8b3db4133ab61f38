//! Relative-time rendering and field formatting.
//!
//! Two display modes are supported:
//!
//! - [`DisplayMode::TimeLeft`] renders `"in 1 hour 5 minutes"`. The hour
//!   segment is dropped when zero, the minute segment is always present, and
//!   already-expired instants clamp to `"in 0 minutes"`.
//! - [`DisplayMode::RelativeMarker`] renders `<t:{epoch}:R>`, an opaque token
//!   a downstream client localizes itself.
//!
//! Field formatting is driven by [`FieldSpec`]s. Each spec pairs an output
//! name with one of a closed set of renderers; free-form templates are parsed
//! into that set up front and rejected if they name anything unknown.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fissure_types::{Era, Fissure};
use serde::{Deserialize, Serialize};

use crate::error::FissureError;
use crate::query::FissureAttribute;

/// How instants are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// `"in 2 hours 3 minutes"`.
    #[default]
    TimeLeft,
    /// `<t:1700000000:R>`.
    RelativeMarker,
}

/// Optional emoji shown in front of era names.
pub type EraEmojiMap = BTreeMap<Era, String>;

/// Render an instant relative to `now`.
pub fn format_relative_time(
    instant: DateTime<Utc>,
    mode: DisplayMode,
    now: DateTime<Utc>,
) -> String {
    match mode {
        DisplayMode::TimeLeft => format_time_left(instant, now),
        DisplayMode::RelativeMarker => format!("<t:{}:R>", instant.timestamp()),
    }
}

fn format_time_left(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let total_minutes = instant.signed_duration_since(now).num_minutes().max(0);
    let hours = total_minutes.checked_div(60).unwrap_or(0);
    let minutes = total_minutes.checked_rem(60).unwrap_or(0);

    let mut out = String::from("in ");
    if hours > 0 {
        out.push_str(&format!("{hours} {} ", plural(hours, "hour")));
    }
    out.push_str(&format!("{minutes} {}", plural(minutes, "minute")));
    out
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        unit.to_owned()
    } else {
        format!("{unit}s")
    }
}

/// One piece of a composite field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text copied as-is.
    Literal(String),
    /// A fissure attribute.
    Attribute(FissureAttribute),
    /// Era with its optional emoji.
    Era,
    /// Expiry rendered in the current display mode.
    Expiry,
}

/// How a field is rendered for each fissure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRender {
    /// Era with its optional emoji.
    Era,
    /// Expiry rendered in the current display mode.
    Expiry,
    /// A single attribute.
    Attribute(FissureAttribute),
    /// A sequence of segments concatenated together.
    Composite(Vec<Segment>),
}

/// An output field: a name plus a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Output field name.
    pub name: String,
    /// Renderer applied to every fissure.
    pub render: FieldRender,
}

/// A rendered output field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedField {
    /// Output field name.
    pub name: String,
    /// One rendered value per fissure, in input order.
    pub values: Vec<String>,
}

impl FieldSpec {
    /// Create a spec from an explicit renderer.
    pub fn new(name: impl Into<String>, render: FieldRender) -> Self {
        Self {
            name: name.into(),
            render,
        }
    }

    /// Parse a template such as `"{mission} - {node} ({planet})"`.
    ///
    /// `{era}` and `{expiry}` are the special era and expiry tokens; any other
    /// placeholder must name a [`FissureAttribute`]. The bare template
    /// `"expiry"` is shorthand for `"{expiry}"`.
    ///
    /// # Errors
    ///
    /// Returns [`FissureError::InvalidTemplate`] for unknown placeholders or
    /// an unterminated `{`.
    pub fn parse(name: impl Into<String>, template: &str) -> Result<Self, FissureError> {
        if template.trim() == "expiry" {
            return Ok(Self::new(name, FieldRender::Expiry));
        }

        let segments = parse_segments(template)?;
        let render = match segments.as_slice() {
            [Segment::Era] => FieldRender::Era,
            [Segment::Expiry] => FieldRender::Expiry,
            [Segment::Attribute(attribute)] => FieldRender::Attribute(*attribute),
            _ => FieldRender::Composite(segments),
        };
        Ok(Self::new(name, render))
    }
}

fn parse_segments(template: &str) -> Result<Vec<Segment>, FissureError> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let (literal, after_open) = rest.split_at(open);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal.to_owned()));
        }
        let body = after_open.get(1..).unwrap_or_default();
        let close = body
            .find('}')
            .ok_or_else(|| FissureError::InvalidTemplate(template.to_owned()))?;
        let (placeholder, after_close) = body.split_at(close);
        segments.push(placeholder_segment(placeholder, template)?);
        rest = after_close.get(1..).unwrap_or_default();
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_owned()));
    }
    Ok(segments)
}

fn placeholder_segment(placeholder: &str, template: &str) -> Result<Segment, FissureError> {
    match placeholder.trim() {
        "era" => Ok(Segment::Era),
        "expiry" => Ok(Segment::Expiry),
        other => other
            .parse::<FissureAttribute>()
            .map(Segment::Attribute)
            .map_err(|_err| {
                FissureError::InvalidTemplate(format!("{template}: unknown {{{other}}}"))
            }),
    }
}

/// Rendering context shared by every field.
struct RenderContext<'a> {
    mode: DisplayMode,
    emoji: &'a EraEmojiMap,
    now: DateTime<Utc>,
}

impl RenderContext<'_> {
    fn era(&self, era: Era) -> String {
        match self.emoji.get(&era) {
            Some(emoji) if !emoji.is_empty() => format!("{emoji} {era}"),
            _ => era.name().to_owned(),
        }
    }

    fn segment(&self, segment: &Segment, fissure: &Fissure) -> String {
        match segment {
            Segment::Literal(text) => text.clone(),
            Segment::Attribute(attribute) => attribute.value(fissure),
            Segment::Era => self.era(fissure.era),
            Segment::Expiry => format_relative_time(fissure.expiry, self.mode, self.now),
        }
    }

    fn field(&self, render: &FieldRender, fissure: &Fissure) -> String {
        match render {
            FieldRender::Era => self.era(fissure.era),
            FieldRender::Expiry => format_relative_time(fissure.expiry, self.mode, self.now),
            FieldRender::Attribute(attribute) => attribute.value(fissure),
            FieldRender::Composite(segments) => segments
                .iter()
                .map(|segment| self.segment(segment, fissure))
                .collect(),
        }
    }
}

/// Render every field for every fissure.
///
/// The result preserves the order of `specs`, and each field's values
/// preserve the order of `fissures`.
pub fn format_fields(
    fissures: &[Fissure],
    specs: &[FieldSpec],
    mode: DisplayMode,
    emoji: &EraEmojiMap,
    now: DateTime<Utc>,
) -> Vec<RenderedField> {
    let context = RenderContext { mode, emoji, now };
    specs
        .iter()
        .map(|spec| RenderedField {
            name: spec.name.clone(),
            values: fissures
                .iter()
                .map(|fissure| context.field(&spec.render, fissure))
                .collect(),
        })
        .collect()
}
