//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into a separate module.
//!
//! Every update from the bot API arrives at the webhook. The webhook always answers with a 200 once the request is
//! authenticated, even when the update could not be handled, because the bot API redelivers anything else.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use stars_common::Secret;
use stars_engine::StoreDatabase;
use telegram_tools::data_objects::Update;

use crate::{dispatcher::Dispatcher, errors::ServerError, inbound::classify};

pub const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// The webhook secret, if one is configured.
#[derive(Clone, Debug, Default)]
pub struct WebhookSecret(pub Option<Secret<String>>);

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(webhook => Post "/webhook" impl StoreDatabase);
pub async fn webhook<B: StoreDatabase>(
    req: HttpRequest,
    body: web::Bytes,
    secret: web::Data<WebhookSecret>,
    dispatcher: web::Data<Dispatcher<B>>,
) -> Result<HttpResponse, ServerError> {
    check_secret(&req, &secret)?;
    let update = match serde_json::from_slice::<Update>(&body) {
        Ok(u) => u,
        Err(e) => {
            warn!("💻️ Ignoring webhook call with an unreadable update. {e}");
            return Ok(HttpResponse::Ok().finish());
        },
    };
    trace!("💻️ Received update {}", update.update_id);
    if let Some(event) = classify(update) {
        dispatcher.dispatch(event).await;
    }
    Ok(HttpResponse::Ok().finish())
}

fn check_secret(req: &HttpRequest, secret: &WebhookSecret) -> Result<(), ServerError> {
    let expected = match &secret.0 {
        Some(s) => s,
        None => return Ok(()),
    };
    let provided = req.headers().get(SECRET_TOKEN_HEADER).and_then(|v| v.to_str().ok());
    if provided == Some(expected.reveal().as_str()) {
        Ok(())
    } else {
        warn!("💻️ Webhook call from {:?} without a valid secret token", req.peer_addr());
        Err(ServerError::Forbidden)
    }
}
