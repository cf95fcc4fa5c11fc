use ratatui::{
    Frame,
    layout::{Layout, Direction, Constraint, Rect},
    widgets::{Block, Borders, BorderType, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    style::{Color, Style, Modifier},
    text::{Line, Span},
};
use crate::app::App;
use crate::columns::{self, BLOCK_COLUMNS};
use crate::endpoint::LookupEndpoint;
use crate::types::KristBlock;

const ACCENT: Color = Color::Cyan;
const DIM: Color = Color::DarkGray;
const ERROR: Color = Color::Red;

// ===============================
// Top-level draw
// ===============================
pub fn draw<E: LookupEndpoint<Item = KristBlock>>(f:&mut Frame, app:&App<E>){
    let show_error = app.table().state().error().is_some();

    let mut constraints: Vec<Constraint> = Vec::with_capacity(3);
    constraints.push(Constraint::Min(0));                               // table
    if show_error { constraints.push(Constraint::Length(1)); }          // error line (kept until next success)
    constraints.push(Constraint::Length(1));                            // footer

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    let mut idx = 0usize;
    blocks_table(f, chunks[idx], app); idx += 1;
    if show_error {
        error_line(f, chunks[idx], app); idx += 1;
    }
    footer(f, chunks[idx], app);

    if app.toast_message().is_some() {
        draw_toast_modal(f, app);
    }
}

// ===============================
// Table
// ===============================
fn blocks_table<E: LookupEndpoint<Item = KristBlock>>(f:&mut Frame, area:Rect, app:&App<E>){
    let table = app.table();
    let options = table.options();

    let header = Row::new(
        BLOCK_COLUMNS.iter().map(|c| {
            let style = if c.sort == Some(options.order_by()) {
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            Cell::from(columns::header_label(c, options)).style(style)
        })
    );

    // Previous page stays on screen while the next one loads
    let rows = app.rows().iter().map(|block| {
        Row::new(BLOCK_COLUMNS.iter().map(|c| Cell::from(columns::cell(block, c.key))))
    });

    let widths = BLOCK_COLUMNS.iter().map(|c| match c.width {
        Some(w) => Constraint::Length(w),
        None => Constraint::Fill(1),
    });

    let title = if table.state().loading() {
        Line::from(vec![Span::raw(" Blocks "), Span::styled("loading… ", Style::default().fg(DIM))])
    } else {
        Line::from(" Blocks ")
    };

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .block(Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(ACCENT)));

    let mut state = TableState::default();
    if !app.rows().is_empty() {
        state.select(Some(app.sel_row()));
    }
    f.render_stateful_widget(widget, area, &mut state);
}

fn error_line<E: LookupEndpoint<Item = KristBlock>>(f:&mut Frame, area:Rect, app:&App<E>){
    if let Some(err) = app.table().state().error() {
        let line = Line::from(vec![
            Span::styled(" ✖ ", Style::default().fg(ERROR).add_modifier(Modifier::BOLD)),
            Span::styled(err.to_string(), Style::default().fg(ERROR)),
            Span::styled("  (r to retry)", Style::default().fg(DIM)),
        ]);
        f.render_widget(Paragraph::new(line), area);
    }
}

// ===============================
// Footer
// ===============================
fn footer<E: LookupEndpoint<Item = KristBlock>>(f:&mut Frame, area:Rect, app:&App<E>){
    let pagination = app.table().pagination();
    let count = app.table().state().result().map(|r| r.count).unwrap_or(0);

    let range = match pagination.item_range(count) {
        Some((first, last)) => format!("{first}-{last} of "),
        None => String::new(),
    };

    let hints = if pagination.show_size_changer {
        "· ←/→ page  Home/End  [/] size  1-5 sort  r refresh  q quit"
    } else {
        "· ←/→ page  Home/End  1-5 sort  r refresh  q quit"
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" Page {}/{} ", pagination.current_page, pagination.page_count()),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("· {range}{} · {}/page ", pagination.total_label("blocks"), pagination.page_size)),
        Span::styled(hints, Style::default().fg(DIM)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

// ===============================
// Overlays
// ===============================
fn draw_toast_modal<E: LookupEndpoint<Item = KristBlock>>(f:&mut Frame, app:&App<E>){
    let Some(msg) = app.toast_message() else { return; };

    let area = f.area();
    let width = (msg.chars().count() as u16 + 4).min(area.width.saturating_sub(4)).max(10);
    let height = 3u16.min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height,
    };

    f.render_widget(Clear, popup);
    let paragraph = Paragraph::new(msg)
        .wrap(Wrap { trim: true })
        .block(Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(ERROR)));
    f.render_widget(paragraph, popup);
}
