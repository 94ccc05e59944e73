/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

extern crate imagefeed;

use anyhow::{Result, anyhow, bail};
use dotenvy::dotenv;
use imagefeed::v1::{
    ApiClient, Config, FileTokenStore, MainContext, MainLoop, NoSessionHooks, OAuth2Service, Services,
    TokenStore, clear_on_first_launch,
};
use std::io::{BufRead, Write};
use std::sync::{Arc, mpsc};
use url::Url;

// Number of feed pages to print
const PAGES_TO_SHOW: usize = 2;

// Runs main context jobs until a completion shows up on `rx`
async fn wait_for<T>(main_loop: &mut MainLoop, rx: mpsc::Receiver<T>) -> Result<T> {
    loop {
        if let Ok(value) = rx.try_recv() {
            return Ok(value);
        }
        if !main_loop.turn().await {
            bail!("main context closed before the request completed");
        }
    }
}

// Asks for the redirect URL (or bare code) after the user approved access in a browser
fn prompt_for_code(services: &Services) -> Result<String> {
    let url = services.oauth.authorization_url()?;
    println!("Open this page and approve access:\n\n  {url}\n");
    print!("Paste the redirect URL or the code shown: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let input = line.trim();
    if input.is_empty() {
        bail!("No code entered");
    }
    Ok(match Url::parse(input) {
        Ok(url) => OAuth2Service::code_from_callback(&url).ok_or_else(|| anyhow!("No code in {url}"))?,
        Err(_) => input.to_string(),
    })
}

async fn login(services: &Services, main_loop: &mut MainLoop) -> Result<()> {
    let code = prompt_for_code(services)?;
    let (tx, rx) = mpsc::channel();
    main_loop.enter(|| {
        services.oauth.fetch_token(&code, move |result| {
            let _ = tx.send(result);
        })
    });
    wait_for(main_loop, rx).await??;
    println!("Logged in");
    Ok(())
}

async fn show_profile(services: &Services, main_loop: &mut MainLoop) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    main_loop.enter(|| {
        services.profile.fetch_profile(move |result| {
            let _ = tx.send(result);
        })
    });
    let profile = wait_for(main_loop, rx).await??;
    println!("{} ({})", profile.name, profile.login_name);
    if let Some(bio) = &profile.bio {
        println!("  {bio}");
    }

    let (tx, rx) = mpsc::channel();
    main_loop.enter(|| {
        services
            .profile_image
            .fetch_profile_image_url(&profile.username, move |result| {
                let _ = tx.send(result);
            })
    });
    match wait_for(main_loop, rx).await? {
        Ok(url) => println!("  avatar: {url}"),
        Err(err) => println!("  no avatar: {err}"),
    }
    Ok(())
}

async fn show_feed(services: &Services, main_loop: &mut MainLoop) -> Result<()> {
    let _subscription = services.images_list.did_change().subscribe({
        let images_list = services.images_list.clone();
        move || println!("-- {} photos cached", images_list.len())
    });

    for _ in 0..PAGES_TO_SHOW {
        let before = services.images_list.len();
        let (tx, rx) = mpsc::channel();
        main_loop.enter(|| {
            services.images_list.fetch_next_page(move |result| {
                let _ = tx.send(result);
            })
        });
        let appended = wait_for(main_loop, rx).await??;
        for photo in services.images_list.photos().iter().skip(before) {
            let liked = if photo.is_liked { "♥" } else { " " };
            println!(
                "{liked} {} {}x{} {}",
                photo.id,
                photo.size.width,
                photo.size.height,
                photo.description.as_deref().unwrap_or("")
            );
        }
        if appended == 0 {
            break;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    let token_store = Arc::new(FileTokenStore::open(config.token_path()?)?);
    if clear_on_first_launch(token_store.as_ref(), &config.install_marker_path()?)? {
        println!("First launch, starting with a clean session");
    }

    let (main, mut main_loop) = MainContext::new();
    let client = ApiClient::from_config(&config, main)?;
    let services = Services::new(&config, client, token_store.clone(), Arc::new(NoSessionHooks));

    if std::env::args().any(|arg| arg == "--logout") {
        main_loop.enter(|| services.logout.logout())?;
        println!("Logged out");
        return Ok(());
    }

    if token_store.get().is_none() {
        login(&services, &mut main_loop).await?;
    }
    show_profile(&services, &mut main_loop).await?;
    show_feed(&services, &mut main_loop).await?;
    Ok(())
}
