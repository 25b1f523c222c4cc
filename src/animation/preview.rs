//! Terminal preview for animation configs using crossterm.
//!
//! Draws one swatch row per group in an alternate screen with true-color,
//! ticking each group through the same [`Animator`] the daemon uses.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    cursor, event,
    style::{self, Color, Stylize},
    terminal, ExecutableCommand, QueueableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::Instant;
use wiz_transport::LightState;

use super::{AnimationConfig, GroupName};
use crate::color;
use crate::daemon::state::{Animator, GroupProgram, TickKind};

/// Width of the swatch block in characters.
const SWATCH_W: usize = 24;
/// Redraw / input poll interval.
const FRAME: Duration = Duration::from_millis(50);

struct Row {
    group: GroupName,
    animator: Animator,
    deadline: Instant,
    kind: Option<TickKind>,
}

/// Run the terminal preview. Blocks until q/Esc/Ctrl-C is pressed.
pub fn run(config: &AnimationConfig) -> anyhow::Result<()> {
    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout
        .execute(terminal::EnterAlternateScreen)?
        .execute(cursor::Hide)?;

    let result = run_loop(&mut stdout, config);

    // Cleanup
    stdout
        .execute(cursor::Show)?
        .execute(terminal::LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    result
}

fn run_loop(stdout: &mut io::Stdout, config: &AnimationConfig) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut rng = StdRng::from_entropy();
    let mut rows: Vec<Row> = config
        .groups
        .iter()
        .map(|(&group, spec)| Row {
            group,
            animator: Animator::new(Arc::new(GroupProgram::new(spec.clone(), config.cycletime))),
            deadline: start,
            kind: None,
        })
        .collect();

    stdout.queue(terminal::Clear(terminal::ClearType::All))?;

    loop {
        // Check for quit
        if event::poll(FRAME)? {
            if let event::Event::Key(key) = event::read()? {
                match key.code {
                    event::KeyCode::Char('q') | event::KeyCode::Esc => break,
                    event::KeyCode::Char('c')
                        if key.modifiers.contains(event::KeyModifiers::CONTROL) =>
                    {
                        break
                    }
                    _ => {}
                }
            }
        }

        let now = Instant::now();
        for row in &mut rows {
            if now < row.deadline {
                continue;
            }
            row.kind = Some(row.animator.next(now, &mut rng)?.kind);
            row.deadline = row.deadline.max(now) + row.animator.program().cycletime;
        }

        // Header
        stdout.queue(cursor::MoveTo(0, 0))?;
        stdout.queue(style::PrintStyledContent(
            format!(
                " Preview  |  cycletime {:.1}s  |  {:6.1}s  |  q/Esc to quit ",
                config.cycletime.as_secs_f64(),
                (now - start).as_secs_f64()
            )
            .with(Color::White)
            .on(Color::DarkGrey),
        ))?;

        for (i, row) in rows.iter().enumerate() {
            let state = row.animator.last().unwrap_or(LightState::Off);
            let rgb = color::swatch(&state);
            let marker = match row.kind {
                Some(TickKind::FlashStart) | Some(TickKind::FlashHeld) => "FLASH",
                _ => "",
            };

            stdout.queue(cursor::MoveTo(0, (i * 2 + 2) as u16))?;
            stdout.queue(terminal::Clear(terminal::ClearType::CurrentLine))?;
            stdout.queue(style::PrintStyledContent(
                format!(" {:<12}", row.group.as_str()).with(Color::White),
            ))?;
            stdout.queue(style::PrintStyledContent(
                " ".repeat(SWATCH_W).on(Color::Rgb {
                    r: rgb.r,
                    g: rgb.g,
                    b: rgb.b,
                }),
            ))?;
            stdout.queue(style::PrintStyledContent(
                format!("  {:<32} {marker}", state.describe()).with(Color::Grey),
            ))?;
        }

        stdout.flush()?;
    }

    Ok(())
}
