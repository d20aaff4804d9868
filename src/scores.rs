//! Best-effort extraction of scores from model feedback text.
//!
//! Models are asked to report an overall score and four aspect ratings, but
//! the format is free text. This module looks for lines such as
//! `**Grammar:** 85/100` or `Content Relevance - 78` and pulls the numbers
//! out. Anything it cannot read is left as `None`; nothing is invented.

use std::sync::OnceLock;

use regex::Regex;

use crate::feedback::SubScores;

/// Scores found in a block of feedback text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParsedScores {
    /// Overall score out of 100.
    pub overall: Option<u8>,
    /// All four aspect ratings; `None` unless every aspect was found.
    pub scores: Option<SubScores>,
}

struct Patterns {
    overall: Regex,
    grammar: Regex,
    coherence: Regex,
    organization: Regex,
    content_relevance: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            overall: labelled(r"overall")?,
            grammar: labelled(r"grammar")?,
            coherence: labelled(r"coherence")?,
            organization: labelled(r"organi[sz]ation")?,
            content_relevance: labelled(r"content\s+relevance")?,
        })
    }
}

/// `<label> [score] <separators> <number>`, case-insensitive.
fn labelled(label: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"(?i)\b{label}\b(?:\s+score)?[\s:*_=()\[\]\-–—]*(\d{{1,3}})\b"
    ))
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| match Patterns::compile() {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::error!(error = %e, "score patterns failed to compile");
                None
            }
        })
        .as_ref()
}

fn first_in_range(re: &Regex, text: &str) -> Option<u8> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<u16>().ok())
        .find(|v| *v <= 100)
        .and_then(|v| u8::try_from(v).ok())
}

/// Extract the overall score and aspect ratings from `text`.
///
/// # Example
///
/// ```rust
/// use essay_scorer::scores::parse_scores;
///
/// let parsed = parse_scores("Overall Score: 82\nGrammar: 90\nCoherence: 80\n\
///                            Organization: 75\nContent Relevance: 70");
/// assert_eq!(parsed.overall, Some(82));
/// assert_eq!(parsed.scores.map(|s| s.grammar), Some(90));
/// ```
pub fn parse_scores(text: &str) -> ParsedScores {
    let Some(p) = patterns() else {
        return ParsedScores::default();
    };

    let overall = first_in_range(&p.overall, text);
    let scores = match (
        first_in_range(&p.grammar, text),
        first_in_range(&p.coherence, text),
        first_in_range(&p.organization, text),
        first_in_range(&p.content_relevance, text),
    ) {
        (Some(grammar), Some(coherence), Some(organization), Some(content_relevance)) => {
            Some(SubScores {
                grammar,
                coherence,
                organization,
                content_relevance,
            })
        }
        _ => None,
    };

    ParsedScores { overall, scores }
}
