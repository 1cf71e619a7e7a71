//! Purpose: Render records as pretty JSON with optional ANSI colorization.
//! Exports: colorize_json.
//! Role: Pure formatter for `decode`/`default`/`check --json` output on a terminal.
//! Invariants: With color off, output equals serde_json::to_string_pretty.
//! Invariants: ANSI escapes wrap single tokens only, never whitespace or newlines.
use serde_json::{Map, Value};

const INDENT: &str = "  ";

// 8/16-color palette; bright variants lose contrast on light themes.
#[derive(Clone, Copy)]
enum Tone {
    Key,
    Text,
    Number,
    Literal,
    Punct,
}

impl Tone {
    fn code(self) -> &'static str {
        match self {
            Tone::Key => "36",
            Tone::Text => "32",
            Tone::Number => "33",
            Tone::Literal => "35",
            Tone::Punct => "39",
        }
    }
}

struct Painter {
    use_color: bool,
    out: String,
}

impl Painter {
    fn token(&mut self, text: &str, tone: Tone) {
        if self.use_color {
            self.out.push_str("\u{1b}[");
            self.out.push_str(tone.code());
            self.out.push('m');
            self.out.push_str(text);
            self.out.push_str("\u{1b}[0m");
        } else {
            self.out.push_str(text);
        }
    }

    fn newline(&mut self, depth: usize) {
        self.out.push('\n');
        self.out.push_str(&INDENT.repeat(depth));
    }

    fn quoted(&mut self, text: &str, tone: Tone) {
        let encoded = serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string());
        self.token(&encoded, tone);
    }

    fn value(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Null => self.token("null", Tone::Literal),
            Value::Bool(flag) => self.token(if *flag { "true" } else { "false" }, Tone::Literal),
            Value::Number(num) => self.token(&num.to_string(), Tone::Number),
            Value::String(text) => self.quoted(text, Tone::Text),
            Value::Array(items) => self.array(items, depth),
            Value::Object(map) => self.object(map, depth),
        }
    }

    fn array(&mut self, items: &[Value], depth: usize) {
        if items.is_empty() {
            self.token("[]", Tone::Punct);
            return;
        }
        self.token("[", Tone::Punct);
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                self.token(",", Tone::Punct);
            }
            self.newline(depth + 1);
            self.value(item, depth + 1);
        }
        self.newline(depth);
        self.token("]", Tone::Punct);
    }

    fn object(&mut self, map: &Map<String, Value>, depth: usize) {
        if map.is_empty() {
            self.token("{}", Tone::Punct);
            return;
        }
        self.token("{", Tone::Punct);
        for (idx, (key, item)) in map.iter().enumerate() {
            if idx > 0 {
                self.token(",", Tone::Punct);
            }
            self.newline(depth + 1);
            self.quoted(key, Tone::Key);
            self.token(":", Tone::Punct);
            self.out.push(' ');
            self.value(item, depth + 1);
        }
        self.newline(depth);
        self.token("}", Tone::Punct);
    }
}

pub fn colorize_json(value: &Value, use_color: bool) -> String {
    let mut painter = Painter {
        use_color,
        out: String::new(),
    };
    painter.value(value, 0);
    painter.out
}
