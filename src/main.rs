pub mod commands;
pub mod error;

use std::env;
use std::sync::Arc;

use poise::serenity_prelude::GatewayIntents;
use serenity::async_trait;
use serenity::client::{Client, Context, EventHandler};
use serenity::model::gateway::Ready;
use tracing::{error, info};

use crate::commands::UserData;
use crate::commands::giveaway::manager::GiveawayManager;
use crate::commands::giveaway::notifier::DiscordNotifier;
use crate::error::Error;

pub struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let framework = poise::Framework::<UserData, Error>::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::giveaway::create_giveaway(),
                commands::giveaway::join(),
                commands::giveaway::end_giveaway(),
                commands::giveaway::reroll(),
                commands::giveaway::giveaways(),
            ],
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let notifier = DiscordNotifier::new(ctx.http.clone());
                Ok(UserData {
                    giveaways: Arc::new(GiveawayManager::new(Box::new(notifier))),
                })
            })
        })
        .build();

    let token = env::var("DISCORD_TOKEN").expect("Expected a DISCORD_TOKEN in the environment");
    let intents = GatewayIntents::non_privileged();
    let mut client = Client::builder(&token, intents)
        .event_handler(Handler)
        .framework(framework)
        .await
        .expect("Cannot create a Discord client");

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }
}
