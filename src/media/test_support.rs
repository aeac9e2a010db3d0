// Local image origin for tests

use axum::{http::header, http::StatusCode, response::IntoResponse, routing::get, Router};
use image::{ImageBuffer, ImageFormat, Rgb, Rgba};
use std::io::Cursor;
use std::time::Duration;

pub const RED: [u8; 3] = [220, 20, 20];
pub const BLUE: [u8; 3] = [20, 20, 220];

pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(width, height, Rgb(color));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    buf
}

/// 300x100: blue | red | blue, in three equal columns
pub fn striped_png() -> Vec<u8> {
    let img = ImageBuffer::from_fn(300, 100, |x, _| {
        if (100..200).contains(&x) {
            Rgb(RED)
        } else {
            Rgb(BLUE)
        }
    });
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    buf
}

/// Semi-transparent PNG, which JPEG cannot carry as-is
pub fn transparent_png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_pixel(width, height, Rgba([10u8, 200, 10, 128]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    buf
}

fn png(bytes: Vec<u8>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], bytes)
}

/// Serve a fixed set of fixtures on an ephemeral port; returns the base URL
pub async fn spawn_image_server() -> String {
    let app = Router::new()
        .route("/square.png", get(|| async { png(solid_png(300, 300, RED)) }))
        .route("/wide.png", get(|| async { png(solid_png(1200, 300, BLUE)) }))
        .route("/tall.png", get(|| async { png(solid_png(100, 400, RED)) }))
        .route("/tiny.png", get(|| async { png(solid_png(10, 10, BLUE)) }))
        .route("/striped.png", get(|| async { png(striped_png()) }))
        .route("/alpha.png", get(|| async { png(transparent_png(64, 64)) }))
        .route("/large.png", get(|| async { png(vec![0u8; 4096]) }))
        .route(
            "/text.txt",
            get(|| async { ([(header::CONTENT_TYPE, "text/plain")], "not an image") }),
        )
        .route("/missing.png", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/slow.png",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                png(solid_png(10, 10, RED))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}
