//! Record editor demo.
//!
//! Edits a small catalog record in the terminal: a repeating list of
//! titles and a vocabulary picker, both committing into one shared
//! `serde_json::Value` record. The final record is printed on exit.
//!
//! Set `RUST_LOG=catform=debug` to log component state transitions
//! (the log output is only readable when redirected to a file, raw
//! mode owns the screen).

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, warn};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    style::{Modifier, Style},
    Frame, Terminal,
};
use serde_json::json;

use catform::{
    data::tree, FormInput, InstanceTemplate, Label, Path, RepeatingInput, Value, VocabularyConfig,
    VocabularyInput,
};

/// Vocabulary set used when no config file is given.
const DEFAULT_VOCABULARIES: &str = r#"
[all]
label = "All Vocabularies"

[person]
label = "Local Persons"
sort_order = 1.0
default_for_search = true

[organization]
label = "Local Organizations"
sort_order = 2.0

[ulan]
label = "ULAN"
"#;

#[derive(Parser)]
#[command(version, about = "Terminal record editor built on catform")]
struct Args {
    /// TOML vocabulary config overriding the built-in set.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Open the record read only.
    #[arg(long)]
    read_only: bool,
}

struct App {
    record: Rc<RefCell<Value>>,
    /// Set by commit callbacks; the loop resyncs the inputs when it is.
    dirty: Rc<Cell<bool>>,
    titles: RepeatingInput,
    vocabulary: VocabularyInput,
    titles_path: Path,
    vocab_path: Path,
    /// 0 = titles, 1 = vocabulary.
    focus: usize,
    titles_area: Rect,
    vocab_area: Rect,
}

impl App {
    fn new(
        record: Rc<RefCell<Value>>,
        vocabularies: &BTreeMap<String, VocabularyConfig>,
        read_only: bool,
    ) -> App {
        let titles_path = Path::from_key("titles");
        let vocab_path = Path::from_key("vocabulary");
        let dirty = Rc::new(Cell::new(false));

        let initial_titles = tree::get(&record.borrow(), &titles_path)
            .cloned()
            .unwrap_or(Value::Null);
        let mut titles = RepeatingInput::new(
            titles_path.clone(),
            InstanceTemplate::line().with_label(Label::new("Title")),
        )
        .with_read_only(read_only)
        .with_value(&initial_titles);

        let tree_record = Rc::clone(&record);
        let flag = Rc::clone(&dirty);
        titles.set_on_commit(move |path, value| {
            if let Err(err) = tree::set(&mut tree_record.borrow_mut(), path, value.clone()) {
                warn!("commit at {path} failed: {err}");
            }
            flag.set(true);
        });

        let tree_record = Rc::clone(&record);
        let flag = Rc::clone(&dirty);
        titles.set_on_add_instance(move |path| {
            if let Err(err) = tree::add_instance(&mut tree_record.borrow_mut(), path) {
                warn!("add at {path} failed: {err}");
            }
            flag.set(true);
        });

        let tree_record = Rc::clone(&record);
        let flag = Rc::clone(&dirty);
        titles.set_on_remove_instance(move |path| {
            if let Err(err) = tree::remove_instance(&mut tree_record.borrow_mut(), path) {
                warn!("remove at {path} failed: {err}");
            }
            flag.set(true);
        });

        let tree_record = Rc::clone(&record);
        let flag = Rc::clone(&dirty);
        titles.set_on_move_instance(move |path, to_index| {
            if let Err(err) = tree::move_instance(&mut tree_record.borrow_mut(), path, to_index) {
                warn!("move at {path} failed: {err}");
            }
            flag.set(true);
        });

        let initial_vocab = tree::get(&record.borrow(), &vocab_path)
            .and_then(Value::as_str)
            .map(str::to_string);
        let mut vocabulary = VocabularyInput::new(vocab_path.clone(), vocabularies)
            .with_read_only(read_only)
            .with_value(initial_vocab);

        let tree_record = Rc::clone(&record);
        let flag = Rc::clone(&dirty);
        vocabulary.set_on_commit(move |path, value| {
            if let Err(err) = tree::set(&mut tree_record.borrow_mut(), path, value.clone()) {
                warn!("commit at {path} failed: {err}");
            }
            flag.set(true);
        });

        let mut app = App {
            record,
            dirty,
            titles,
            vocabulary,
            titles_path,
            vocab_path,
            focus: 0,
            titles_area: Rect::default(),
            vocab_area: Rect::default(),
        };
        app.apply_focus();
        app
    }

    fn apply_focus(&mut self) {
        self.titles.set_focused(self.focus == 0);
        self.vocabulary.set_focused(self.focus == 1);
    }

    fn focus_next(&mut self) {
        if self.vocabulary.is_empty() {
            return;
        }
        self.focus = (self.focus + 1) % 2;
        self.apply_focus();
    }

    fn focus_titles(&mut self) {
        if self.focus != 0 {
            self.focus = 0;
            self.vocabulary.set_focused(false);
        }
    }

    fn focus_vocabulary(&mut self) {
        if self.focus != 1 {
            self.focus = 1;
            self.titles.set_focused(false);
        }
    }

    /// Rebuild the inputs from the record after callbacks changed it.
    fn resync(&mut self) {
        let record = self.record.borrow();
        let titles_value = tree::get(&record, &self.titles_path)
            .cloned()
            .unwrap_or(Value::Null);
        self.titles.set_value(titles_value);
        let vocab_value = tree::get(&record, &self.vocab_path)
            .and_then(Value::as_str)
            .map(str::to_string);
        drop(record);
        self.vocabulary.set_value(vocab_value);
    }
}

fn load_vocabularies(config: Option<&PathBuf>) -> anyhow::Result<BTreeMap<String, VocabularyConfig>> {
    let text = match config {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading vocabulary config {}", path.display()))?,
        None => DEFAULT_VOCABULARIES.to_string(),
    };
    toml::from_str(&text).context("parsing vocabulary config")
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn draw_ui(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    if area.width == 0 || area.height == 0 {
        return;
    }
    let buf = frame.buffer_mut();
    let bottom = area.y + area.height;

    buf.set_string(
        area.x,
        area.y,
        format!("catform {} record editor", catform::VERSION),
        Style::new().add_modifier(Modifier::BOLD),
    );

    let titles_y = area.y + 2;
    if titles_y >= bottom {
        return;
    }
    let titles_height = app.titles.preferred_height().min(bottom - titles_y);
    app.titles_area = Rect::new(area.x, titles_y, area.width.min(46), titles_height);
    app.titles.render(app.titles_area, buf);

    let label_y = titles_y + titles_height + 1;
    if label_y + 1 < bottom && !app.vocabulary.is_empty() {
        buf.set_string(
            area.x,
            label_y,
            "Vocabulary",
            Style::new().add_modifier(Modifier::BOLD),
        );
        app.vocab_area = Rect::new(area.x, label_y + 1, area.width.min(30), 1);
        app.vocabulary.render(app.vocab_area, buf);
    }

    let hint_y = bottom - 1;
    if hint_y > label_y + 1 {
        buf.set_string(
            area.x,
            hint_y,
            "Tab moves between fields, Esc quits",
            Style::new().add_modifier(Modifier::DIM),
        );
    }

    // The popup draws over everything else.
    app.vocabulary.render_popup(area, buf);
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> anyhow::Result<()> {
    loop {
        terminal.draw(|frame| draw_ui(frame, app))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(());
                }
                let consumed = match app.focus {
                    0 => app.titles.handle_key(key),
                    _ => app.vocabulary.handle_key(key),
                };
                if !consumed {
                    match key.code {
                        KeyCode::Esc => return Ok(()),
                        KeyCode::Tab | KeyCode::BackTab => app.focus_next(),
                        _ => {}
                    }
                }
            }
            Event::Mouse(mouse) => {
                // An open popup may overlap the titles rows, so it gets
                // first refusal.
                if app.vocabulary.is_open() {
                    if app.vocabulary.handle_mouse(mouse, app.vocab_area) {
                        app.focus_vocabulary();
                    } else if app.titles.handle_mouse(mouse, app.titles_area) {
                        app.focus_titles();
                    }
                } else if app.titles.handle_mouse(mouse, app.titles_area) {
                    app.focus_titles();
                } else if app.vocabulary.handle_mouse(mouse, app.vocab_area) {
                    app.focus_vocabulary();
                }
            }
            _ => {}
        }

        if app.dirty.get() {
            app.dirty.set(false);
            app.resync();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::init();
    }
    debug!("record editor starting");

    let vocabularies = load_vocabularies(args.config.as_ref())?;
    let record = Rc::new(RefCell::new(json!({
        "titles": ["Ladderback chair", "Side chair"],
        "vocabulary": "person",
    })));
    let mut app = App::new(Rc::clone(&record), &vocabularies, args.read_only);

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    result?;

    // Flush any edit still sitting in a focused input.
    app.titles.set_focused(false);
    app.vocabulary.set_focused(false);

    println!("{}", serde_json::to_string_pretty(&*record.borrow())?);
    Ok(())
}
