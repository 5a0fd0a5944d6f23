use pairchat::{api, ServerState};

/// Capacity used when ROOM_CAPACITY is not set: pair strangers two by two.
const DEFAULT_ROOM_CAPACITY: usize = 2;

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(3030);
    let room_capacity: usize = std::env::var("ROOM_CAPACITY")
        .ok()
        .and_then(|capacity| capacity.parse().ok())
        .unwrap_or(DEFAULT_ROOM_CAPACITY);
    if room_capacity == 0 {
        // a zero capacity would reject every placement; refuse to start
        // instead of silently clamping it
        log::error!("ROOM_CAPACITY must be at least 1");
        std::process::exit(1);
    }

    // One registry for the whole process; dropped with everything in it on
    // shutdown.
    let state = ServerState::new(room_capacity);

    let routes = api::build_filters(state);

    log::info!("listening on 127.0.0.1:{}", port);
    warp::serve(routes).run(([127, 0, 0, 1], port)).await;
}
