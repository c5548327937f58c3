//! Cursor-based tokenizer for export markup.
//!
//! Produces a flat sequence of start tags, end tags and text runs from the
//! loosely structured HTML the exporter writes. It never fails: stray `<`
//! characters become text, comments and doctype declarations are dropped,
//! and unterminated constructs run to the end of input. Entities in text
//! and attribute values are decoded.
//!
//! Both the navigation builder and the metadata reader walk these tokens
//! instead of scanning raw characters.

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is raw text up to the matching close tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// A start tag with its attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    /// Lowercase element name.
    pub name: String,
    /// Attributes in source order; names are lowercase.
    pub attrs: Vec<(String, String)>,
    /// Written as `<x/>` or a void element.
    pub self_closing: bool,
}

impl Tag {
    /// Value of the first attribute called `name`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the `class` attribute lists a class containing `fragment`.
    pub fn class_contains(&self, fragment: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c.contains(fragment)))
    }

    /// Whether the `class` attribute lists exactly `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }
}

/// One markup token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Start(Tag),
    End(String),
    Text(String),
}

impl Token {
    /// Start tag named `name`, if this is one.
    pub fn as_start(&self, name: &str) -> Option<&Tag> {
        match self {
            Self::Start(tag) if tag.name == name => Some(tag),
            _ => None,
        }
    }

    pub fn is_end(&self, name: &str) -> bool {
        matches!(self, Self::End(n) if n == name)
    }
}

/// Tokenize a complete markup document.
pub fn tokenize(input: &str) -> Vec<Token> {
    Tokenizer::new(input).collect()
}

/// Concatenated text between the start tag at `start` and its matching end.
///
/// Returns the text (whitespace-collapsed) and the index just past the
/// matching end tag, or the token count when the element is unterminated.
pub fn element_text(tokens: &[Token], start: usize) -> (String, usize) {
    let Some(Token::Start(tag)) = tokens.get(start) else {
        return (String::new(), start + 1);
    };
    if tag.self_closing {
        return (String::new(), start + 1);
    }

    let mut depth = 0usize;
    let mut text = String::new();
    let mut idx = start + 1;
    while let Some(token) = tokens.get(idx) {
        match token {
            Token::Start(inner) if inner.name == tag.name && !inner.self_closing => depth += 1,
            Token::End(name) if *name == tag.name => {
                if depth == 0 {
                    return (collapse_whitespace(&text), idx + 1);
                }
                depth -= 1;
            }
            Token::Text(run) => {
                text.push_str(run);
            }
            _ => {}
        }
        idx += 1;
    }
    (collapse_whitespace(&text), idx)
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Streaming tokenizer over a borrowed document.
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    /// Close tag that ends the current raw text element.
    raw_until: Option<String>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            raw_until: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Consume raw text up to `</name`, case-insensitively.
    fn raw_text(&mut self, name: &str) -> Option<Token> {
        let rest = self.rest();
        let needle = format!("</{name}");
        let end = rest
            .to_ascii_lowercase()
            .find(&needle)
            .unwrap_or(rest.len());
        self.pos += end;
        (end > 0).then(|| Token::Text(rest[..end].to_owned()))
    }

    fn text(&mut self) -> Token {
        let rest = self.rest();
        // A lone `<` that does not open a tag is text; skip past it first.
        let search_from = usize::from(rest.starts_with('<'));
        let end = rest[search_from..]
            .find('<')
            .map_or(rest.len(), |i| i + search_from);
        self.pos += end;
        Token::Text(html_escape::decode_html_entities(&rest[..end]).into_owned())
    }

    /// Skip `<!-- ... -->`, `<!...>` and `<?...>` constructs.
    fn skip_declaration(&mut self) {
        let rest = self.rest();
        let end = if rest.starts_with("<!--") {
            rest.find("-->").map_or(rest.len(), |i| i + 3)
        } else {
            rest.find('>').map_or(rest.len(), |i| i + 1)
        };
        self.pos += end;
    }

    fn end_tag(&mut self) -> Token {
        let rest = self.rest();
        let close = rest.find('>').map_or(rest.len(), |i| i + 1);
        let name = rest[2..close]
            .trim_end_matches('>')
            .trim()
            .to_ascii_lowercase();
        self.pos += close;
        Token::End(name)
    }

    fn start_tag(&mut self) -> Token {
        let bytes = self.input.as_bytes();
        let mut i = self.pos + 1;
        let name_start = i;
        while i < bytes.len() && is_name_byte(bytes[i]) {
            i += 1;
        }
        let name = self.input[name_start..i].to_ascii_lowercase();

        let mut attrs = Vec::new();
        let mut self_closing = false;
        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            match bytes.get(i) {
                None => break,
                Some(b'>') => {
                    i += 1;
                    break;
                }
                Some(b'/') => {
                    self_closing = true;
                    i += 1;
                    continue;
                }
                Some(_) => {}
            }

            let key_start = i;
            while i < bytes.len() && !matches!(bytes[i], b'=' | b'>' | b'/') {
                if bytes[i].is_ascii_whitespace() {
                    break;
                }
                i += 1;
            }
            let key = self.input[key_start..i].to_ascii_lowercase();
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }

            let mut value = String::new();
            if bytes.get(i) == Some(&b'=') {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                let (raw, next) = match bytes.get(i) {
                    Some(&quote @ (b'"' | b'\'')) => {
                        let body = i + 1;
                        let close = self.input[body..]
                            .find(char::from(quote))
                            .map_or(bytes.len(), |j| body + j);
                        (&self.input[body..close], (close + 1).min(bytes.len()))
                    }
                    _ => {
                        let body = i;
                        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>'
                        {
                            i += 1;
                        }
                        (&self.input[body..i], i)
                    }
                };
                value = html_escape::decode_html_entities(raw).into_owned();
                i = next;
            }

            if key.is_empty() {
                // Unparseable byte; step over it.
                i += 1;
            } else {
                self_closing = false;
                attrs.push((key, value));
            }
        }

        self.pos = i.min(bytes.len());
        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) && !self_closing {
            self.raw_until = Some(name.clone());
        }
        let self_closing = self_closing || VOID_ELEMENTS.contains(&name.as_str());
        Token::Start(Tag {
            name,
            attrs,
            self_closing,
        })
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(name) = self.raw_until.take()
            && let Some(token) = self.raw_text(&name)
        {
            return Some(token);
        }

        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return None;
            }
            let bytes = rest.as_bytes();
            if bytes[0] != b'<' {
                return Some(self.text());
            }
            match bytes.get(1) {
                Some(b'!' | b'?') => self.skip_declaration(),
                Some(b'/') if bytes.get(2).is_some_and(|b| b.is_ascii_alphabetic()) => {
                    return Some(self.end_tag());
                }
                Some(b) if b.is_ascii_alphabetic() => return Some(self.start_tag()),
                _ => return Some(self.text()),
            }
        }
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b':'
}
