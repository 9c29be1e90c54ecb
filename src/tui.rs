use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::{DefaultTerminal, Frame};

use crate::error::Result;
use crate::fmt::money;

pub const ACCENT: Color = Color::Rgb(31, 119, 180);

pub const HEADER_STYLE: Style = Style::new().fg(ACCENT).add_modifier(Modifier::BOLD);

pub const TITLE_STYLE: Style = Style::new().add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const NOTICE_STYLE: Style = Style::new().fg(Color::Yellow);

pub const ERROR_STYLE: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);

pub const COST_STYLE: Style = Style::new().fg(Color::Rgb(126, 176, 255));
pub const CREDIT_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

/// Amount as a colored Span. Costs are positive; negative rows are credits.
pub fn money_span(amount: f64) -> Span<'static> {
    let style = if amount < 0.0 { CREDIT_STYLE } else { COST_STYLE };
    Span::styled(money(amount), style)
}

/// Cut a label to `width` chars, ending with an ellipsis when shortened.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}

pub enum ReportViewAction {
    Continue,
    Close,
}

pub trait ReportView {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ReportViewAction;
}

/// Ctrl-C closes any view; otherwise the view decides.
fn dispatch_key(view: &mut dyn ReportView, key: KeyEvent) -> ReportViewAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return ReportViewAction::Close;
    }
    view.handle_key(key.code)
}

/// Takes over the terminal until `view` asks to close. The terminal is
/// restored on every exit path, panics included.
pub fn run_report_view(view: &mut dyn ReportView) -> Result<()> {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        previous(info);
    }));

    let mut terminal = ratatui::init();
    let result = drive(&mut terminal, view);
    drop(terminal);
    ratatui::restore();
    result
}

fn drive(terminal: &mut DefaultTerminal, view: &mut dyn ReportView) -> Result<()> {
    loop {
        terminal.draw(|frame| view.draw(frame))?;
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if let ReportViewAction::Close = dispatch_key(view, key) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("REVISAO", 10), "REVISAO");
        assert_eq!(truncate("MANUTENCAO PREVENTIVA", 8), "MANUTEN…");
    }

    #[test]
    fn test_money_span_styles() {
        assert_eq!(money_span(10.0).style, COST_STYLE);
        assert_eq!(money_span(-10.0).style, CREDIT_STYLE);
        assert_eq!(money_span(10.0).content, "R$ 10.00");
    }

    struct Keys(Vec<KeyCode>);

    impl ReportView for Keys {
        fn draw(&mut self, _frame: &mut Frame) {}
        fn handle_key(&mut self, code: KeyCode) -> ReportViewAction {
            self.0.push(code);
            match code {
                KeyCode::Esc => ReportViewAction::Close,
                _ => ReportViewAction::Continue,
            }
        }
    }

    #[test]
    fn test_ctrl_c_closes_without_reaching_view() {
        let mut view = Keys(Vec::new());
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(dispatch_key(&mut view, ctrl_c), ReportViewAction::Close));
        assert!(view.0.is_empty());

        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert!(matches!(dispatch_key(&mut view, plain_c), ReportViewAction::Continue));
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert!(matches!(dispatch_key(&mut view, esc), ReportViewAction::Close));
        assert_eq!(view.0, vec![KeyCode::Char('c'), KeyCode::Esc]);
    }
}
