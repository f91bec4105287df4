use forecast_core::{Action, Session};
use inquire::{InquireError, Text};

use crate::render;

/// What a line typed at the prompt asks for.
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Quit,
    ToggleUnit,
    Locate,
    City(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        ":q" | ":quit" => Input::Quit,
        ":u" | ":unit" => Input::ToggleUnit,
        ":l" | ":locate" => Input::Locate,
        city => Input::City(city),
    }
}

/// Prompt loop over one session; returns when the user quits.
pub async fn run(session: &mut Session) -> anyhow::Result<()> {
    println!("{}\n", render::BANNER);

    loop {
        let line = match Text::new("City:")
            .with_placeholder("Enter city name")
            .with_help_message(":u switch units, :l locate me, :q quit")
            .prompt()
        {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        let state = match parse_input(&line) {
            Input::Quit => break,
            Input::ToggleUnit => {
                if session.state().report.is_some() {
                    println!("⏳ Loading...");
                }
                session.toggle_unit().await
            }
            Input::Locate => {
                println!("⏳ Locating...");
                session.locate().await
            }
            Input::City(city) => {
                session.dispatch(Action::SetCity(city.to_string())).await;
                if !city.is_empty() {
                    println!("⏳ Loading...");
                }
                session.dispatch(Action::SubmitCity).await
            }
        };

        match render::render_state(state) {
            Some(text) => println!("{text}\n"),
            None => println!("Units: {}\n", state.unit.suffix()),
        }
    }

    Ok(())
}
