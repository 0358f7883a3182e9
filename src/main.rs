use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;

use crm_client::console::command::{HELP, is_yes};
use crm_client::console::{Command, render};
use crm_client::domain::record::Record;
use crm_client::forms::import::parse_records_csv;
use crm_client::forms::record::RecordForm;
use crm_client::notifications::{self, ChannelState, ListenerConfig};
use crm_client::repository::HttpRepository;
use crm_client::services::{ListState, RecordListController};

type Controller = RecordListController<HttpRepository>;
type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let client_config = match crm_client::load_config() {
        Ok(client_config) => client_config,
        Err(err) => {
            log::error!("Error loading client config: {err}");
            std::process::exit(1);
        }
    };

    let repo = match HttpRepository::from_config(&client_config) {
        Ok(repo) => repo,
        Err(err) => {
            log::error!("Error building record repository: {err}");
            std::process::exit(1);
        }
    };

    let controller = RecordListController::from_config(repo, &client_config);
    let listener = notifications::spawn(
        ListenerConfig::from(&client_config),
        Arc::new(controller.clone()),
    );
    let screen = tokio::spawn(redraw_on_change(controller.subscribe(), listener.subscribe()));

    controller.reload().await;

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    if let Err(e) = run_console(&controller, &mut input).await {
        log::error!("Console input failed: {e}");
    }

    screen.abort();
    listener.shutdown().await;
}

/// Redraws the list whenever the controller state or the channel state
/// changes, skipping the instant before the loading indicator is due.
async fn redraw_on_change(
    mut list: watch::Receiver<ListState>,
    mut channel: watch::Receiver<ChannelState>,
) {
    loop {
        tokio::select! {
            changed = list.changed() => if changed.is_err() { break },
            changed = channel.changed() => if changed.is_err() { break },
        }
        let state = list.borrow_and_update().clone();
        let channel_state = *channel.borrow_and_update();
        if state.busy && !state.loading {
            continue;
        }
        println!("\n{}", render(&state, channel_state));
    }
}

async fn run_console(controller: &Controller, input: &mut Input) -> std::io::Result<()> {
    println!("{HELP}");
    loop {
        let Some(line) = prompt(input, "> ").await? else {
            return Ok(());
        };

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match command {
            Command::Next => {
                if controller.next_page().await.is_none() {
                    println!("Already on the last page");
                }
            }
            Command::Prev => {
                if controller.prev_page().await.is_none() {
                    println!("Already on the first page");
                }
            }
            Command::Page(index) => {
                if controller.set_page(index).await.is_none() {
                    println!("No page {}", index + 1);
                }
            }
            Command::Size(size) => {
                controller.set_page_size(size).await;
            }
            Command::Search(term) => {
                controller.set_search_term(term).await;
            }
            Command::Add => {
                let draft = controller.begin_create();
                edit_and_save(controller, input, draft).await?;
            }
            Command::Edit(id) => match controller.begin_edit(id) {
                Some(draft) => edit_and_save(controller, input, draft).await?,
                None => println!("Record {id} is not on this page"),
            },
            Command::Delete(id) => {
                controller.request_delete(id);
                let answer = prompt(input, &format!("Delete record {id}? [y/N] "))
                    .await?
                    .unwrap_or_default();
                if is_yes(&answer) {
                    controller.confirm_delete().await;
                } else {
                    controller.cancel_delete();
                    println!("Delete cancelled");
                }
            }
            Command::Import(path) => {
                match read_import(&path).await {
                    Ok(forms) => {
                        let summary = controller.import_records(forms).await;
                        for (row, reason) in &summary.failed {
                            println!("Row {row}: {reason}");
                        }
                    }
                    Err(e) => println!("Cannot import {}: {e}", path.display()),
                }
            }
            Command::Reload => {
                controller.dismiss_messages();
                controller.reload().await;
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(()),
        }
    }
}

async fn read_import(path: &Path) -> Result<Vec<RecordForm>, String> {
    let data = tokio::fs::read(path).await.map_err(|e| e.to_string())?;
    parse_records_csv(data.as_slice()).map_err(|e| e.to_string())
}

/// Asks for every field, keeping the current value on an empty answer.
async fn edit_and_save(
    controller: &Controller,
    input: &mut Input,
    mut draft: Record,
) -> std::io::Result<()> {
    for (label, value) in [
        ("Name", &mut draft.name),
        ("Address", &mut draft.address),
        ("Email", &mut draft.email),
        ("Telephone", &mut draft.telephone),
    ] {
        let Some(answer) = prompt(input, &format!("{label} [{value}]: ")).await? else {
            controller.discard_draft();
            return Ok(());
        };
        if !answer.trim().is_empty() {
            *value = answer;
        }
    }

    let answer = prompt(input, "Save? [Y/n] ").await?.unwrap_or_default();
    if answer.trim().is_empty() || is_yes(&answer) {
        controller.save(draft).await;
    } else {
        controller.discard_draft();
        println!("Changes discarded");
    }
    Ok(())
}

async fn prompt(input: &mut Input, text: &str) -> std::io::Result<Option<String>> {
    print!("{text}");
    std::io::stdout().flush()?;
    input.next_line().await
}
