#![allow(dead_code)]

use actix_web::web;
use ghibli_relay::{server::AppState, Config, ProviderConfig, ProxyConfig};

pub const BOUNDARY: &str = "----ghibli-relay-test-boundary";

pub enum Field<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

/// Encodes fields as a multipart/form-data body.
pub fn multipart(fields: &[Field]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for field in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match field {
            Field::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Field::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

/// Config pointing the provider at a mock server, with no fallback image.
pub fn config_for(provider_uri: &str) -> Config {
    Config::new()
        .without_fallback_image()
        .with_provider(
            ProviderConfig::new()
                .with_api_key("test-api-key")
                .with_base_url(provider_uri),
        )
        .with_proxy(ProxyConfig::new().with_allowed_hosts(["127.0.0.1"]))
}

pub fn state(config: &Config) -> web::Data<AppState> {
    web::Data::new(AppState::from_config(config).expect("app state"))
}
