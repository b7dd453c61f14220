//! printf-style result-message templates.
//!
//! Supported placeholders: `%s`, `%d`, `%f`, `%.Nf`, plus `%%` for a literal
//! percent sign. Arguments are substituted positionally.

/// Template for a performance run: `"<verb> %s <noun> in %.2f seconds."`.
pub fn performance_message(verb: &str, noun: &str) -> String {
    format!("{verb} %s {noun} in %.2f seconds.")
}

/// Template for a thread-safety run: `"%d users <verb> %d <noun> in %.2f seconds."`.
pub fn thread_safety_message(verb: &str, noun: &str) -> String {
    format!("%d users {verb} %d {noun} in %.2f seconds.")
}

/// A value substituted into a template slot.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateArg {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<u64> for TemplateArg {
    fn from(v: u64) -> Self {
        TemplateArg::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<i64> for TemplateArg {
    fn from(v: i64) -> Self {
        TemplateArg::Int(v)
    }
}

impl From<f64> for TemplateArg {
    fn from(v: f64) -> Self {
        TemplateArg::Float(v)
    }
}

impl From<&str> for TemplateArg {
    fn from(v: &str) -> Self {
        TemplateArg::Text(v.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Text,
    Int,
    Float { precision: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot { slot: Slot, raw: String },
}

/// A parsed result-message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl ResultTemplate {
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((start, c)) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }

            match chars.peek().map(|&(_, next)| next) {
                Some('%') => {
                    chars.next();
                    literal.push('%');
                }
                Some('s') | Some('d') | Some('f') => {
                    let (end, kind) = chars
                        .next()
                        .map(|(i, k)| (i + 1, k))
                        .unwrap_or((start + 1, 's'));
                    let slot = match kind {
                        's' => Slot::Text,
                        'd' => Slot::Int,
                        _ => Slot::Float { precision: 6 },
                    };
                    push_slot(&mut segments, &mut literal, slot, &source[start..end]);
                }
                Some('.') => {
                    // `%.Nf`: only a slot when digits are followed by `f`.
                    let rest = &source[start + 2..];
                    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                    let is_slot = !digits.is_empty() && rest[digits.len()..].starts_with('f');
                    if is_slot {
                        let precision = digits.parse().unwrap_or(6);
                        let end = start + 2 + digits.len() + 1;
                        while chars.peek().is_some_and(|&(i, _)| i < end) {
                            chars.next();
                        }
                        push_slot(
                            &mut segments,
                            &mut literal,
                            Slot::Float { precision },
                            &source[start..end],
                        );
                    } else {
                        literal.push('%');
                    }
                }
                _ => literal.push('%'),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn has_float_slot(&self) -> bool {
        self.slots().any(|s| matches!(s, Slot::Float { .. }))
    }

    pub fn has_int_slot(&self) -> bool {
        self.slots().any(|s| matches!(s, Slot::Int))
    }

    pub fn slot_count(&self) -> usize {
        self.slots().count()
    }

    fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot { slot, .. } => Some(*slot),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute `args` into the slots in order.
    ///
    /// Surplus arguments are ignored; slots without an argument are kept
    /// verbatim.
    pub fn render(&self, args: &[TemplateArg]) -> String {
        let mut out = String::with_capacity(self.source.len() + 16);
        let mut args = args.iter();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot { slot, raw } => match args.next() {
                    Some(arg) => out.push_str(&render_slot(*slot, arg)),
                    None => out.push_str(raw),
                },
            }
        }
        out
    }
}

fn push_slot(segments: &mut Vec<Segment>, literal: &mut String, slot: Slot, raw: &str) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
    segments.push(Segment::Slot {
        slot,
        raw: raw.to_string(),
    });
}

fn render_slot(slot: Slot, arg: &TemplateArg) -> String {
    match (slot, arg) {
        (Slot::Float { precision }, TemplateArg::Float(v)) => format!("{v:.precision$}"),
        (Slot::Float { precision }, TemplateArg::Int(v)) => format!("{:.precision$}", *v as f64),
        (Slot::Int, TemplateArg::Float(v)) => format!("{}", v.trunc() as i64),
        (_, TemplateArg::Int(v)) => v.to_string(),
        (_, TemplateArg::Float(v)) => v.to_string(),
        (_, TemplateArg::Text(v)) => v.clone(),
    }
}
