use crate::models::CandidateSummary;

// Decides whether a candidate matches a free-text query. Plain mode is a
// case-insensitive substring test across name, email, job title, and skills;
// boolean mode supports AND/OR/NOT, parentheses, and quoted phrases. Never
// panics and never returns an error: a malformed boolean expression falls
// back to plain matching of the whole query string.
pub fn matches(query: &str, boolean_enabled: bool, candidate: &CandidateSummary) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }

    if !boolean_enabled {
        return term_matches(query, candidate);
    }

    match parse_query(query) {
        Ok(expr) => eval(&expr, candidate),
        Err(e) => {
            tracing::debug!(query = query, error = ?e, "boolean parse failed, using plain match");
            term_matches(query, candidate)
        }
    }
}

// One atomic term against the four searchable fields. A hit in any one
// field is sufficient. Candidates without a revealed email have no email
// field to match.
fn term_matches(term: &str, candidate: &CandidateSummary) -> bool {
    let term = term.to_lowercase();

    if candidate.full_name.to_lowercase().contains(&term) {
        return true;
    }
    if let Some(email) = &candidate.email {
        if email.to_lowercase().contains(&term) {
            return true;
        }
    }
    if candidate.job_title.to_lowercase().contains(&term) {
        return true;
    }
    candidate
        .skills
        .iter()
        .any(|skill| skill.to_lowercase().contains(&term))
}

// --- Expression tree ---

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Term(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

fn eval(expr: &Expr, candidate: &CandidateSummary) -> bool {
    match expr {
        Expr::Term(text) => term_matches(text, candidate),
        Expr::Not(inner) => !eval(inner, candidate),
        Expr::And(left, right) => eval(left, candidate) && eval(right, candidate),
        Expr::Or(left, right) => eval(left, candidate) || eval(right, candidate),
    }
}

// --- Tokenizer ---

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Term(String),
    And,
    Or,
    Not,
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ParseError {
    UnclosedQuote,
    UnbalancedParen,
    DanglingOperator,
    Empty,
}

// Quoted phrases are extracted here, before any whitespace splitting, so a
// phrase stays one atomic term with its internal whitespace intact.
fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '"' => {
                chars.next();
                let mut phrase = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    phrase.push(c);
                }
                if !closed {
                    return Err(ParseError::UnclosedQuote);
                }
                tokens.push(Token::Term(phrase));
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' || c == '"' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                match word.to_lowercase().as_str() {
                    "and" => tokens.push(Token::And),
                    "or" => tokens.push(Token::Or),
                    "not" => tokens.push(Token::Not),
                    _ => tokens.push(Token::Term(word)),
                }
            }
        }
    }

    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(tokens)
}

// --- Parser ---

// Recursive descent with conventional precedence: NOT > AND > OR. Two
// adjacent atoms with no operator between them are an implicit AND.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

fn parse_query(input: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        // trailing tokens, e.g. an unmatched ')'
        return Err(ParseError::UnbalancedParen);
    }
    Ok(expr)
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.next();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;
        loop {
            match self.peek() {
                Some(Token::And) => {
                    self.next();
                }
                // implicit AND between adjacent atoms
                Some(Token::Not) | Some(Token::Term(_)) | Some(Token::Open) => {}
                _ => break,
            }
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.peek() == Some(&Token::Not) {
            self.next();
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        match self.next() {
            Some(Token::Term(text)) => Ok(Expr::Term(text)),
            Some(Token::Open) => {
                let expr = self.parse_or()?;
                if self.next() != Some(Token::Close) {
                    return Err(ParseError::UnbalancedParen);
                }
                Ok(expr)
            }
            _ => Err(ParseError::DanglingOperator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VisaStatus;

    fn candidate(name: &str, title: &str, skills: &[&str]) -> CandidateSummary {
        CandidateSummary {
            id: "c-1".to_string(),
            full_name: name.to_string(),
            job_title: title.to_string(),
            location: "Berlin, Germany".to_string(),
            visa_status: VisaStatus::Citizen,
            open_to_relocation: true,
            job_domain: "software".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            viewed_by_me: false,
            email: None,
            last_active: None,
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let c = candidate("Mia Chen", "Data Engineer", &["Python"]);
        assert!(matches("", false, &c));
        assert!(matches("   ", false, &c));
        assert!(matches("", true, &c));
    }

    #[test]
    fn test_plain_matches_each_field() {
        let mut c = candidate("Mia Chen", "Data Engineer", &["Python", "Airflow"]);
        c.email = Some("mia.chen@example.com".to_string());

        assert!(matches("mia", false, &c));
        assert!(matches("chen@example", false, &c));
        assert!(matches("data eng", false, &c));
        assert!(matches("airflow", false, &c));
        assert!(matches("AIRFLOW", false, &c));
        assert!(!matches("kubernetes", false, &c));
    }

    #[test]
    fn test_plain_ignores_unrevealed_email() {
        let c = candidate("Mia Chen", "Data Engineer", &["Python"]);
        assert!(!matches("example.com", false, &c));
    }

    #[test]
    fn test_plain_query_is_one_term_not_tokens() {
        // in plain mode the whole query is a single substring, so word order
        // and adjacency matter
        let c = candidate("Mia Chen", "Data Engineer", &[]);
        assert!(!matches("engineer data", false, &c));
        assert!(matches("data engineer", false, &c));
    }

    #[test]
    fn test_boolean_and_or_not() {
        let c = candidate("Omar Haddad", "Platform Engineer", &["Go", "Terraform"]);

        assert!(matches("go AND terraform", true, &c));
        assert!(!matches("go AND kubernetes", true, &c));
        assert!(matches("go OR kubernetes", true, &c));
        assert!(matches("NOT kubernetes", true, &c));
        assert!(!matches("NOT go", true, &c));
        assert!(matches("not KUBERNETES", true, &c));
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let c = candidate("Omar Haddad", "Platform Engineer", &["Go", "Terraform"]);

        // absent OR (present AND present) = true; a left-to-right read
        // would also be true, so check the distinguishing combination too
        assert_eq!(
            matches("rust OR go AND terraform", true, &c),
            matches("rust OR (go AND terraform)", true, &c)
        );
        assert!(matches("rust OR go AND terraform", true, &c));

        // present OR (present AND absent): precedence gives true, a
        // left-to-right read would give false
        assert!(matches("go OR terraform AND rust", true, &c));
        assert_eq!(
            matches("go OR terraform AND rust", true, &c),
            matches("go OR (terraform AND rust)", true, &c)
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let c = candidate("Omar Haddad", "Platform Engineer", &["Go", "Terraform"]);
        assert!(!matches("(go OR terraform) AND rust", true, &c));
    }

    #[test]
    fn test_quoted_phrase_is_atomic() {
        let c = candidate("Sam Lee", "Developer", &["full stack developer"]);

        assert!(matches("\"full stack\"", true, &c));
        assert!(matches("full AND stack", true, &c));
        assert!(!matches("\"full stack intern\"", true, &c));
        assert!(!matches("\"stack full\"", true, &c));
    }

    #[test]
    fn test_quoted_phrase_with_operator_word_inside() {
        let c = candidate("Sam Lee", "Developer", &["search and rescue"]);
        assert!(matches("\"search and rescue\"", true, &c));
    }

    #[test]
    fn test_implicit_and_between_adjacent_terms() {
        let c = candidate("Sam Lee", "Developer", &["full stack developer"]);
        assert!(matches("full stack", true, &c));
        assert!(!matches("full intern", true, &c));
        assert!(matches("full (stack OR intern)", true, &c));
    }

    #[test]
    fn test_not_chains_and_grouping() {
        let c = candidate("Sam Lee", "Developer", &["Rust"]);
        assert!(matches("NOT NOT rust", true, &c));
        assert!(matches("NOT (java OR go)", true, &c));
        assert!(!matches("NOT (rust OR go)", true, &c));
    }

    #[test]
    fn test_malformed_falls_back_to_plain_match() {
        let c = candidate("Sam Lee", "Developer", &["Rust"]);

        // none of these may panic, and each must equal the plain-mode
        // substring result for the whole raw query string
        for bad in ["AND OR (", "rust AND", "NOT", "(rust", "rust)", "\"unclosed"] {
            assert_eq!(matches(bad, true, &c), matches(bad, false, &c));
        }

        // fallback can still match when the raw string is a real substring
        let c2 = candidate("Sam Lee", "Developer", &["full stack AND more"]);
        assert!(matches("stack AND", true, &c2));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_query("\"open"), Err(ParseError::UnclosedQuote));
        assert_eq!(parse_query("(a OR b"), Err(ParseError::UnbalancedParen));
        assert_eq!(parse_query("a)"), Err(ParseError::UnbalancedParen));
        assert_eq!(parse_query("AND a"), Err(ParseError::DanglingOperator));
        assert_eq!(parse_query("a AND"), Err(ParseError::DanglingOperator));
        assert_eq!(parse_query("   "), Err(ParseError::Empty));
    }

    #[test]
    fn test_parse_tree_shape() {
        let expr = parse_query("a OR b AND c").unwrap();
        assert_eq!(
            expr,
            Expr::Or(
                Box::new(Expr::Term("a".to_string())),
                Box::new(Expr::And(
                    Box::new(Expr::Term("b".to_string())),
                    Box::new(Expr::Term("c".to_string()))
                ))
            )
        );
    }
}
