use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::collections::HashSet;
use std::io::stdout;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::api::{ApiClient, RevealResponse};
use crate::filter::{self, FilterState, ViewedFilter};
use crate::gate::{CreditGate, RevealDecision, RevealState};
use crate::models::{CandidateSummary, ViewCredits};

// Outcome of one background reveal call, sent back to the event loop.
enum RevealOutcome {
    Answered {
        candidate_id: String,
        response: RevealResponse,
    },
    Failed {
        candidate_id: String,
        message: String,
    },
}

struct AppState {
    candidates: Vec<CandidateSummary>,
    filtered: Vec<CandidateSummary>,
    filter: FilterState,
    selected: usize,
    scroll_offset: u16,
    editing_query: bool,
    expanded: HashSet<String>,
    gate: CreditGate,
}

impl AppState {
    fn new(candidates: Vec<CandidateSummary>, filter: FilterState, gate: CreditGate) -> Self {
        let mut state = Self {
            candidates,
            filtered: Vec::new(),
            filter,
            selected: 0,
            scroll_offset: 0,
            editing_query: false,
            expanded: HashSet::new(),
            gate,
        };
        state.apply_filter();
        state
    }

    fn selected_candidate(&self) -> Option<&CandidateSummary> {
        self.filtered.get(self.selected)
    }

    // Recomputed on every filter-state change; keeps the selection in bounds.
    fn apply_filter(&mut self) {
        self.filtered = filter::filter(&self.candidates, &self.filter);
        filter::sort_candidates(&mut self.filtered, self.filter.sort);
        if self.filtered.is_empty() {
            self.selected = 0;
        } else {
            self.selected = self.selected.min(self.filtered.len() - 1);
        }
    }

    fn next(&mut self) {
        self.leave_selected_card();
        if !self.filtered.is_empty() && self.selected < self.filtered.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        self.leave_selected_card();
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    // A denial card is visible only while its candidate stays selected;
    // navigating away completes the Denied -> Idle transition.
    fn leave_selected_card(&mut self) {
        if let Some(c) = self.selected_candidate() {
            let id = c.id.clone();
            self.gate.acknowledge_denial(&id);
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    fn cycle_viewed_filter(&mut self) {
        self.filter.viewed = match self.filter.viewed {
            ViewedFilter::All => ViewedFilter::Viewed,
            ViewedFilter::Viewed => ViewedFilter::NotViewed,
            ViewedFilter::NotViewed => ViewedFilter::All,
        };
        self.apply_filter();
    }

    // Applies a finished reveal. Late results for a candidate the filter no
    // longer shows still land in the gate cache; results arriving after
    // quit are discarded with the channel.
    fn apply_outcome(&mut self, outcome: RevealOutcome) {
        match outcome {
            RevealOutcome::Answered {
                candidate_id,
                response,
            } => match self.gate.complete_reveal(&candidate_id, response) {
                Ok(detail) => {
                    let email = detail.email.clone();
                    self.expanded.insert(candidate_id.clone());
                    if let Some(c) = self.candidates.iter_mut().find(|c| c.id == candidate_id) {
                        c.viewed_by_me = true;
                        c.email = Some(email);
                    }
                    self.apply_filter();
                }
                Err(_) => {
                    // gate already holds the failure message for the card
                }
            },
            RevealOutcome::Failed {
                candidate_id,
                message,
            } => {
                self.gate.fail_reveal(&candidate_id, message);
            }
        }
    }
}

pub fn run_browse(api: &ApiClient, filter_state: FilterState) -> Result<()> {
    let stats = api.credit_stats()?;
    let candidates = api.list_candidates()?;
    if candidates.is_empty() {
        println!("No candidates found.");
        return Ok(());
    }

    let gate = CreditGate::new(ViewCredits {
        company_remaining: stats.remaining_views,
        personal_used: 0, // server-corrected on the first reveal
    });
    let mut state = AppState::new(candidates, filter_state, gate);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, api);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    api: &ApiClient,
) -> Result<()> {
    let mut list_state = ListState::default();
    let (tx, rx) = mpsc::channel::<RevealOutcome>();

    loop {
        // apply reveals that finished since the last frame
        while let Ok(outcome) = rx.try_recv() {
            state.apply_outcome(outcome);
        }

        if state.filtered.is_empty() {
            list_state.select(None);
        } else {
            list_state.select(Some(state.selected));
        }
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        // poll so pending reveal results keep flowing while idle
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if state.editing_query {
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => state.editing_query = false,
                    KeyCode::Backspace => {
                        state.filter.query.pop();
                        state.apply_filter();
                    }
                    KeyCode::Char(c) => {
                        state.filter.query.push(c);
                        state.apply_filter();
                    }
                    _ => {}
                }
                continue;
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                KeyCode::Char('/') => state.editing_query = true,
                KeyCode::Char('b') => {
                    state.filter.boolean_search = !state.filter.boolean_search;
                    state.apply_filter();
                }
                KeyCode::Char('w') => state.cycle_viewed_filter(),
                KeyCode::Char('v') | KeyCode::Enter => trigger_reveal(state, api, &tx),
                _ => {}
            }
        }
    }
    Ok(())
}

// Routes a reveal action through the gate. Only a Fetch decision spawns the
// network thread; everything else resolves locally.
fn trigger_reveal(state: &mut AppState, api: &ApiClient, tx: &mpsc::Sender<RevealOutcome>) {
    let Some(candidate) = state.selected_candidate() else {
        return;
    };
    let candidate_id = candidate.id.clone();

    match state.gate.begin_reveal(&candidate_id) {
        RevealDecision::Fetch => {
            let api = api.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                let outcome = match api.reveal_candidate(&candidate_id) {
                    Ok(response) => RevealOutcome::Answered {
                        candidate_id,
                        response,
                    },
                    Err(e) => RevealOutcome::Failed {
                        candidate_id,
                        message: e.to_string(),
                    },
                };
                // the loop may have quit; a dead receiver just drops the result
                let _ = tx.send(outcome);
            });
        }
        RevealDecision::CachedToggle => {
            if !state.expanded.remove(&candidate_id) {
                state.expanded.insert(candidate_id);
            }
        }
        RevealDecision::AlreadyRequesting | RevealDecision::Denied => {}
    }
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[0]);

    // Left panel: candidate list
    let items: Vec<ListItem> = state
        .filtered
        .iter()
        .map(|c| {
            let marker = match state.gate.state(&c.id) {
                RevealState::Revealed => "+",
                RevealState::Requesting => "~",
                RevealState::Denied => "-",
                RevealState::Failed(_) => "!",
                RevealState::Idle => {
                    if c.viewed_by_me {
                        "*"
                    } else {
                        " "
                    }
                }
            };
            ListItem::new(format!(
                "{} {} | {}",
                marker,
                truncate(&c.full_name, 20),
                truncate(&c.job_title, 24)
            ))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Candidates ({}/{}) ",
            state.filtered.len(),
            state.candidates.len()
        )))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, panes[0], list_state);

    // Right panel: profile detail
    let detail = build_detail(state);
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Profile | {} credits left ",
            state.gate.credits().company_remaining
        )))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, panes[1]);

    // Filter summary line
    let viewed = match state.filter.viewed {
        ViewedFilter::All => "all",
        ViewedFilter::Viewed => "viewed",
        ViewedFilter::NotViewed => "not-viewed",
    };
    let mode = if state.filter.boolean_search {
        "boolean"
    } else {
        "plain"
    };
    let cursor = if state.editing_query { "_" } else { "" };
    let summary = Paragraph::new(format!(
        " query: {}{}  [{}]  viewed: {}",
        state.filter.query, cursor, mode, viewed
    ))
    .style(if state.editing_query {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    });
    frame.render_widget(summary, rows[1]);

    // Footer help
    let help = if state.editing_query {
        " type to filter  Enter/ESC: done"
    } else {
        " j/k:navigate  J/K:scroll  /:query  b:boolean  w:viewed  v/Enter:reveal  q:quit"
    };
    let help = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[2]);
}

fn build_detail<'a>(state: &'a AppState) -> Text<'a> {
    let Some(candidate) = state.selected_candidate() else {
        return Text::raw("No candidate selected");
    };

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        &candidate.full_name,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!(
        "{} | {}",
        candidate.job_title, candidate.location
    )));
    lines.push(Line::from(format!("Domain: {}", candidate.job_domain)));
    lines.push(Line::from(format!("Visa: {}", candidate.visa_status)));
    lines.push(Line::from(format!(
        "Relocation: {}",
        if candidate.open_to_relocation { "yes" } else { "no" }
    )));
    if let Some(last_active) = candidate.last_active {
        lines.push(Line::from(format!(
            "Last active: {}",
            last_active.format("%Y-%m-%d")
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Skills",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    let skills = state
        .gate
        .detail(&candidate.id)
        .map(|d| d.skills.join(", "))
        .unwrap_or_else(|| candidate.skills.join(", "));
    for line in textwrap::fill(&skills, 60).lines() {
        lines.push(Line::from(format!("  {}", line)));
    }

    lines.push(Line::from(""));

    match state.gate.state(&candidate.id) {
        RevealState::Revealed if state.expanded.contains(&candidate.id) => {
            if let Some(detail) = state.gate.detail(&candidate.id) {
                lines.push(Line::from(Span::styled(
                    "Contact",
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(format!("  Email: {}", detail.email)));
                if let Some(phone) = &detail.phone {
                    lines.push(Line::from(format!("  Phone: {}", phone)));
                }
                if let Some(resume) = &detail.resume_url {
                    lines.push(Line::from(format!("  Resume: {}", resume)));
                }
            }
        }
        RevealState::Revealed => {
            lines.push(Line::from(Span::styled(
                "(contact hidden - press v to expand)",
                Style::default().fg(Color::DarkGray),
            )));
        }
        RevealState::Requesting => {
            lines.push(Line::from(Span::styled(
                "Revealing profile...",
                Style::default().fg(Color::Yellow),
            )));
        }
        RevealState::Denied => {
            lines.push(Line::from(Span::styled(
                "No company view credits remaining.",
                Style::default().fg(Color::Red),
            )));
        }
        RevealState::Failed(message) => {
            lines.push(Line::from(Span::styled(
                format!("Reveal failed: {} (press v to retry)", message),
                Style::default().fg(Color::Red),
            )));
        }
        RevealState::Idle => {
            lines.push(Line::from(Span::styled(
                format!(
                    "(press v to reveal full profile - {} company credits left)",
                    state.gate.credits().company_remaining
                ),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    Text::from(lines)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
