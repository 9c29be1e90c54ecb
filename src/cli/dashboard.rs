use chrono::{Months, NaiveDate};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::cli::export::{default_path, export_dataset};
use crate::cli::{open_filtered, FilterArgs, Source};
use crate::error::{LoadError, Result};
use crate::filter::Selection;
use crate::fmt::{format_k, number, percent};
use crate::models::{Dataset, Field};
use crate::reports;
use crate::session::Session;
use crate::settings::Settings;
use crate::tui::{
    money_span, run_report_view, truncate, ReportView, ReportViewAction, ACCENT, ERROR_STYLE,
    FOOTER_STYLE, HEADER_STYLE, NOTICE_STYLE, SELECTED_STYLE, TITLE_STYLE,
};

const TITLE: &str = "COST REPORT | SCANIA";

const PICKER_KEYS: [(char, Field); 5] = [
    ('d', Field::DealerCategory),
    ('c', Field::Category),
    ('t', Field::DocumentType),
    ('n', Field::TaskName),
    ('k', Field::ConsolidatedTask),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Overview,
    Records { offset: usize },
    Picker { field: Field, cursor: usize },
}

struct Dashboard {
    session: Session,
    filtered: Dataset,
    export_dir: String,
    dealer_top: Option<usize>,
    screen: Screen,
    status_message: Option<String>,
}

impl Dashboard {
    fn new(session: Session, settings: &Settings) -> Self {
        let filtered = session.filtered();
        Self {
            session,
            filtered,
            export_dir: settings.export_dir.clone(),
            dealer_top: settings.dealer_top_n,
            screen: Screen::Overview,
            status_message: None,
        }
    }

    fn recompute(&mut self) {
        self.filtered = self.session.filtered();
    }

    // -----------------------------------------------------------------------
    // Filter actions
    // -----------------------------------------------------------------------

    /// None → most recent year → … → oldest year → None.
    fn cycle_year(&mut self) {
        let years = &self.session.options().years;
        let next = match self.session.filters.year {
            None => years.first().copied(),
            Some(current) => years
                .iter()
                .position(|y| *y == current)
                .and_then(|i| years.get(i + 1))
                .copied(),
        };
        self.session.filters.year = next;
        self.recompute();
    }

    /// Move one end of the date range by whole months, kept inside the data span.
    fn shift_range(&mut self, start_months: i32, end_months: i32) {
        let options = self.session.options();
        let (min, max) = (options.min_date, options.max_date);
        let (start, end) = self.session.filters.effective_range(options);
        let start = shift_months(start, start_months).max(min).min(end);
        let end = shift_months(end, end_months).min(max).max(start);
        self.session.filters.date_range = if (start, end) == (min, max) {
            None
        } else {
            Some((start, end))
        };
        self.recompute();
    }

    fn reset(&mut self) {
        self.session.reset_filters();
        self.recompute();
        self.status_message = Some("Filters reset".to_string());
    }

    fn refresh(&mut self) {
        if self.session.refresh() {
            self.status_message = Some(format!(
                "Reloaded {} records",
                number(self.session.dataset().len())
            ));
        } else {
            self.status_message = Some("Source unchanged".to_string());
        }
        self.recompute();
    }

    fn export(&mut self) {
        let path = default_path(&self.export_dir);
        self.status_message = Some(match export_dataset(&self.filtered, &path) {
            Ok(Some(count)) => format!("Exported {} records to {}", number(count), path.display()),
            Ok(None) => "Nothing to export".to_string(),
            Err(e) => format!("Export failed: {e}"),
        });
    }

    fn open_picker(&mut self, field: Field) {
        if self.session.options().values(field).is_empty() {
            self.status_message = Some(format!("No values for {}", field.canonical()));
            return;
        }
        self.screen = Screen::Picker { field, cursor: 0 };
    }

    fn picker_values(&self, field: Field) -> &[String] {
        self.session.options().values(field)
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    fn handle_overview_key(&mut self, code: KeyCode) -> ReportViewAction {
        self.status_message = None;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ReportViewAction::Close,
            KeyCode::Tab => self.screen = Screen::Records { offset: 0 },
            KeyCode::Char('y') => self.cycle_year(),
            KeyCode::Char('[') => self.shift_range(-1, 0),
            KeyCode::Char(']') => self.shift_range(1, 0),
            KeyCode::Char('{') => self.shift_range(0, -1),
            KeyCode::Char('}') => self.shift_range(0, 1),
            KeyCode::Char('a') => self.reset(),
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('e') => self.export(),
            KeyCode::Char(c) => {
                if let Some((_, field)) = PICKER_KEYS.iter().find(|(k, _)| *k == c) {
                    self.open_picker(*field);
                }
            }
            _ => {}
        }
        ReportViewAction::Continue
    }

    fn handle_records_key(&mut self, code: KeyCode, offset: usize) -> ReportViewAction {
        let last = self.filtered.len().saturating_sub(1);
        let offset = match code {
            KeyCode::Char('q') => return ReportViewAction::Close,
            KeyCode::Tab | KeyCode::Esc => {
                self.screen = Screen::Overview;
                return ReportViewAction::Continue;
            }
            KeyCode::Down | KeyCode::Char('j') => offset + 1,
            KeyCode::Up | KeyCode::Char('k') => offset.saturating_sub(1),
            KeyCode::PageDown => offset + 20,
            KeyCode::PageUp => offset.saturating_sub(20),
            KeyCode::Home => 0,
            KeyCode::End => last,
            _ => offset,
        };
        self.screen = Screen::Records {
            offset: offset.min(last),
        };
        ReportViewAction::Continue
    }

    fn handle_picker_key(&mut self, code: KeyCode, field: Field, cursor: usize) -> ReportViewAction {
        let values = self.picker_values(field).to_vec();
        let last = values.len().saturating_sub(1);
        let mut cursor = cursor;
        match code {
            KeyCode::Enter | KeyCode::Esc => {
                self.screen = Screen::Overview;
                return ReportViewAction::Continue;
            }
            KeyCode::Down | KeyCode::Char('j') => cursor = (cursor + 1).min(last),
            KeyCode::Up | KeyCode::Char('k') => cursor = cursor.saturating_sub(1),
            KeyCode::Char(' ') => {
                if let (Some(value), Some(selection)) =
                    (values.get(cursor), self.session.filters.selection_mut(field))
                {
                    selection.toggle(value, &values);
                }
                self.recompute();
            }
            KeyCode::Char('a') => {
                if let Some(selection) = self.session.filters.selection_mut(field) {
                    *selection = Selection::All;
                }
                self.recompute();
            }
            KeyCode::Char('n') => {
                if let Some(selection) = self.session.filters.selection_mut(field) {
                    *selection = Selection::none();
                }
                self.recompute();
            }
            _ => {}
        }
        self.screen = Screen::Picker { field, cursor };
        ReportViewAction::Continue
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let file = self
            .session
            .source()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let updated = format!("{file}  Updated {} ", chrono::Local::now().format("%d/%m/%Y"));
        let [left, right] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(updated.chars().count() as u16),
        ])
        .areas(area);
        frame.render_widget(Paragraph::new(format!(" {TITLE}")).style(HEADER_STYLE), left);
        frame.render_widget(Paragraph::new(updated).style(FOOTER_STYLE).right_aligned(), right);
    }

    fn filter_summary(&self) -> Line<'static> {
        let options = self.session.options();
        let filters = &self.session.filters;
        let (start, end) = filters.effective_range(options);
        let mut spans = vec![
            Span::raw(" Due "),
            Span::styled(
                format!("{}..{}", start.format("%d/%m/%Y"), end.format("%d/%m/%Y")),
                TITLE_STYLE,
            ),
            Span::raw("  Year "),
            Span::styled(
                filters.year.map(|y| y.to_string()).unwrap_or_else(|| "all".to_string()),
                TITLE_STYLE,
            ),
        ];
        for (field, selection) in filters.selections() {
            let universe = options.values(field);
            if universe.is_empty() {
                continue;
            }
            let shown = match selection {
                Selection::All => "all".to_string(),
                Selection::Only(_) => format!(
                    "{}/{}",
                    selection.selected_count(universe),
                    universe.len()
                ),
            };
            spans.push(Span::raw(format!("  {} ", field.label())));
            spans.push(Span::styled(shown, TITLE_STYLE));
        }
        Line::from(spans)
    }

    fn draw_hints(&self, frame: &mut Frame, area: Rect, hints: &str) {
        let widget = match &self.status_message {
            Some(msg) => Paragraph::new(format!(" {msg}")).style(NOTICE_STYLE),
            None => Paragraph::new(format!(" {hints}")).style(FOOTER_STYLE),
        };
        frame.render_widget(widget, area);
    }

    fn draw_overview(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, filters_area, sep, body_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.draw_header(frame, header_area);
        frame.render_widget(Paragraph::new(self.filter_summary()), filters_area);
        frame.render_widget(
            Paragraph::new("━".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep,
        );
        self.draw_hints(
            frame,
            hints_area,
            "d/c/t/n/k=filters  y=year  [ ]=start  { }=end  a=reset  Tab=records  e=export  r=refresh  q=quit",
        );

        if let Some(error) = &self.session.outcome().error {
            draw_load_problem(frame, body_area, error);
            return;
        }
        if self.filtered.is_empty() {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::from(""),
                    Line::from(Span::styled(" No records match the current filters.", NOTICE_STYLE)),
                    Line::from(Span::styled(" Press a to reset them.", FOOTER_STYLE)),
                ]),
                body_area,
            );
            return;
        }

        let [cards_area, charts_area, tables_area] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Percentage(50),
            Constraint::Fill(1),
        ])
        .areas(body_area);

        self.draw_cards(frame, cards_area);

        let [monthly_area, dealer_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(charts_area);
        self.draw_monthly(frame, monthly_area);
        self.draw_dealers(frame, dealer_area);

        let [category_area, task_area, supplier_area] = Layout::horizontal([
            Constraint::Percentage(30),
            Constraint::Percentage(35),
            Constraint::Percentage(35),
        ])
        .areas(tables_area);
        self.draw_categories(frame, category_area);
        self.draw_tasks(frame, task_area);
        self.draw_suppliers(frame, supplier_area);
    }

    fn draw_cards(&self, frame: &mut Frame, area: Rect) {
        let summary = reports::get_summary(&self.filtered);
        let cards = [
            ("Total Cost", money_span(summary.total)),
            ("Documents", Span::styled(number(summary.count), TITLE_STYLE)),
            ("Average Cost", money_span(summary.average)),
            (
                "Largest Expense",
                summary
                    .largest
                    .map(money_span)
                    .unwrap_or_else(|| Span::raw("-")),
            ),
        ];
        let areas = Layout::horizontal([Constraint::Percentage(25); 4]).split(area);
        for ((title, value), card) in cards.into_iter().zip(areas.iter()) {
            let block = Block::bordered()
                .title(Span::styled(format!(" {title} "), FOOTER_STYLE))
                .border_style(Style::default().fg(ACCENT));
            frame.render_widget(Paragraph::new(Line::from(value)).block(block).centered(), *card);
        }
    }

    fn draw_monthly(&self, frame: &mut Frame, area: Rect) {
        let block = section_block("Monthly Costs");
        if !self.filtered.has(Field::DueDate) {
            frame.render_widget(missing_column(Field::DueDate).block(block), area);
            return;
        }
        let months = reports::get_monthly(&self.filtered);
        if months.is_empty() {
            frame.render_widget(placeholder("No dated records.").block(block), area);
            return;
        }
        let inner_width = area.width.saturating_sub(2) as usize;
        let bar_width = (inner_width / months.len()).saturating_sub(1).clamp(1, 8) as u16;
        let bars: Vec<Bar> = months
            .iter()
            .map(|m| {
                Bar::default()
                    .value(m.total.max(0.0).round() as u64)
                    .label(Line::from(m.period.short_label()))
                    .text_value(format_k(m.total))
                    .style(Style::default().fg(ACCENT))
            })
            .collect();
        let chart = BarChart::default()
            .block(block)
            .bar_width(bar_width)
            .bar_gap(1)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn draw_dealers(&self, frame: &mut Frame, area: Rect) {
        let block = section_block("Cost by Dealer");
        if !self.filtered.has(Field::DealerCategory) {
            frame.render_widget(missing_column(Field::DealerCategory).block(block), area);
            return;
        }
        let dealers = reports::get_dealer_chart(&self.filtered, self.dealer_top);
        // Ascending data; ratatui draws the first bar at the top, so the
        // largest dealer goes first.
        let bars: Vec<Bar> = dealers
            .iter()
            .rev()
            .map(|g| {
                Bar::default()
                    .value(g.total.max(0.0).round() as u64)
                    .label(Line::from(truncate(&g.name, 14)))
                    .text_value(format_k(g.total))
                    .style(Style::default().fg(Color::Rgb(255, 127, 14)))
            })
            .collect();
        let chart = BarChart::default()
            .block(block)
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .data(BarGroup::default().bars(&bars));
        frame.render_widget(chart, area);
    }

    fn draw_categories(&self, frame: &mut Frame, area: Rect) {
        let block = section_block("Cost by Category");
        if !self.filtered.has(Field::Category) {
            frame.render_widget(missing_column(Field::Category).block(block), area);
            return;
        }
        let total = self.filtered.total();
        let name_width = area.width.saturating_sub(22) as usize;
        let lines: Vec<Line> = reports::get_categories(&self.filtered)
            .iter()
            .map(|g| {
                let share = if total > 0.0 { (g.total / total).clamp(0.0, 1.0) } else { 0.0 };
                let blocks = (share * 8.0).round() as usize;
                Line::from(vec![
                    Span::raw(format!(" {:<width$} ", truncate(&g.name, name_width), width = name_width)),
                    Span::styled(format!("{:<8}", "█".repeat(blocks)), Style::default().fg(ACCENT)),
                    Span::raw(format!(" {:>6}", percent(g.total, total))),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_tasks(&self, frame: &mut Frame, area: Rect) {
        let block = section_block("Top Consolidated Tasks");
        if !self.filtered.has(Field::ConsolidatedTask) {
            frame.render_widget(missing_column(Field::ConsolidatedTask).block(block), area);
            return;
        }
        let rows: Vec<Row> = reports::get_top_tasks(&self.filtered)
            .into_iter()
            .enumerate()
            .map(|(i, g)| {
                Row::new(vec![
                    Cell::from(format!("{:>2}", i + 1)),
                    Cell::from(g.name),
                    Cell::from(Line::from(money_span(g.total)).right_aligned()),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [Constraint::Length(2), Constraint::Fill(1), Constraint::Length(16)],
        )
        .block(block);
        frame.render_widget(table, area);
    }

    fn draw_suppliers(&self, frame: &mut Frame, area: Rect) {
        let block = section_block("Suppliers");
        if !self.filtered.has(Field::SupplierName) {
            frame.render_widget(missing_column(Field::SupplierName).block(block), area);
            return;
        }
        let rows: Vec<Row> = reports::get_suppliers(&self.filtered)
            .into_iter()
            .map(|s| {
                Row::new(vec![
                    Cell::from(s.name),
                    Cell::from(Line::from(number(s.documents)).right_aligned()),
                    Cell::from(Line::from(money_span(s.total)).right_aligned()),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [Constraint::Fill(1), Constraint::Length(5), Constraint::Length(16)],
        )
        .header(Row::new(vec!["Supplier", "Docs", "Amount"]).style(FOOTER_STYLE))
        .block(block);
        frame.render_widget(table, area);
    }

    fn draw_records(&self, frame: &mut Frame, offset: usize) {
        let area = frame.area();
        let [header_area, filters_area, body_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);
        self.draw_header(frame, header_area);
        frame.render_widget(Paragraph::new(self.filter_summary()), filters_area);
        self.draw_hints(frame, hints_area, "Up/Down/PgUp/PgDn=scroll  Tab/Esc=overview  q=quit");

        let block = section_block(&format!("Records ({})", number(self.filtered.len())));
        if self.filtered.is_empty() {
            frame.render_widget(
                placeholder("No records match the current filters.").block(block),
                body_area,
            );
            return;
        }

        let columns: Vec<Field> = [
            Field::DueDate,
            Field::DealerCategory,
            Field::SupplierName,
            Field::DocumentNumber,
            Field::DocumentType,
            Field::ConsolidatedTask,
            Field::Amount,
        ]
        .into_iter()
        .filter(|f| self.filtered.has(*f))
        .collect();

        let visible = body_area.height.saturating_sub(3) as usize;
        let rows: Vec<Row> = reports::get_records_by_due_date(&self.filtered)
            .into_iter()
            .skip(offset)
            .take(visible)
            .map(|r| {
                Row::new(columns.iter().map(|f| match f {
                    Field::DueDate => Cell::from(
                        r.due_date
                            .map(|d| d.format("%d/%m/%Y").to_string())
                            .unwrap_or_default(),
                    ),
                    Field::Amount => Cell::from(Line::from(money_span(r.amount)).right_aligned()),
                    _ => Cell::from(r.text(*f).unwrap_or_default().to_string()),
                }))
            })
            .collect();
        let widths: Vec<Constraint> = columns
            .iter()
            .map(|f| match f {
                Field::DueDate => Constraint::Length(10),
                Field::Amount => Constraint::Length(16),
                Field::DocumentNumber | Field::DocumentType => Constraint::Length(12),
                _ => Constraint::Fill(1),
            })
            .collect();
        let table = Table::new(rows, widths)
            .header(
                Row::new(columns.iter().map(|f| f.label()))
                    .style(HEADER_STYLE),
            )
            .block(block);
        frame.render_widget(table, body_area);
    }

    fn draw_picker(&self, frame: &mut Frame, field: Field, cursor: usize) {
        let area = frame.area();
        let [header_area, title_area, body_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);
        self.draw_header(frame, header_area);
        self.draw_hints(frame, hints_area, "Up/Down=move  Space=toggle  a=all  n=none  Enter/Esc=done");

        let values = self.picker_values(field);
        let selection = self
            .session
            .filters
            .selection(field)
            .cloned()
            .unwrap_or_default();
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(format!(" {}", field.label()), TITLE_STYLE),
                Span::styled(
                    format!("  {} of {} selected", selection.selected_count(values), values.len()),
                    FOOTER_STYLE,
                ),
            ])),
            title_area,
        );

        let height = body_area.height as usize;
        let start = cursor.saturating_sub(height.saturating_sub(1));
        let lines: Vec<Line> = values
            .iter()
            .enumerate()
            .skip(start)
            .take(height)
            .map(|(i, value)| {
                let mark = if selection.is_selected(value) { "[x]" } else { "[ ]" };
                let style = if i == cursor { SELECTED_STYLE } else { Style::default() };
                Line::from(Span::styled(format!(" {mark} {value}"), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), body_area);
    }
}

impl ReportView for Dashboard {
    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Overview => self.draw_overview(frame),
            Screen::Records { offset } => self.draw_records(frame, offset),
            Screen::Picker { field, cursor } => self.draw_picker(frame, field, cursor),
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> ReportViewAction {
        match self.screen {
            Screen::Overview => self.handle_overview_key(code),
            Screen::Records { offset } => self.handle_records_key(code, offset),
            Screen::Picker { field, cursor } => self.handle_picker_key(code, field, cursor),
        }
    }
}

fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

fn section_block(title: &str) -> Block<'static> {
    Block::default()
        .title(Span::styled(format!(" {title} "), TITLE_STYLE))
        .borders(Borders::TOP)
        .border_style(FOOTER_STYLE)
}

fn placeholder(text: &str) -> Paragraph<'static> {
    Paragraph::new(Span::styled(format!(" {text}"), FOOTER_STYLE))
}

fn missing_column(field: Field) -> Paragraph<'static> {
    placeholder(&format!("Column {} not present in the source.", field.canonical()))
}

fn draw_load_problem(frame: &mut Frame, area: Rect, error: &LoadError) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {error}"), ERROR_STYLE)),
        Line::from(""),
    ];
    for hint in error.hints() {
        lines.push(Line::from(Span::styled(format!("   {hint}"), FOOTER_STYLE)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Fix the file and press r to reload.",
        Style::default().add_modifier(Modifier::ITALIC),
    )));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

pub fn run(filters: &FilterArgs, source: &Source, settings: &Settings) -> Result<()> {
    let session = open_filtered(source, filters)?;
    let mut dashboard = Dashboard::new(session, settings);
    run_report_view(&mut dashboard)
}
