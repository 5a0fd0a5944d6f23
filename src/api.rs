use std::convert::Infallible;

use warp::Filter;

use crate::{user_connected, ServerState};

static INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
    <head>
        <title>Pair Chat</title>
    </head>
    <body>
        <h1>Pair chat</h1>
        <p><em>You are paired with the next stranger who connects.</em></p>
        <div id="chat">
            <p><em>Connecting...</em></p>
        </div>
        <input type="text" id="text" />
        <button type="button" id="send">Send</button>
        <script type="text/javascript">
        const chat = document.getElementById('chat');
        const text = document.getElementById('text');
        const uri = 'ws://' + location.host + '/chat';
        const ws = new WebSocket(uri);
        function message(data) {
            const line = document.createElement('p');
            line.innerText = data;
            chat.appendChild(line);
        }
        ws.onopen = function() {
            chat.innerHTML = '<p><em>Connected!</em></p>';
        };
        ws.onmessage = function(msg) {
            message(msg.data);
        };
        ws.onclose = function() {
            chat.getElementsByTagName('em')[0].innerText = 'Disconnected!';
        };
        send.onclick = function() {
            const msg = text.value;
            ws.send(msg);
            text.value = '';
            message('<You>: ' + msg);
        };
        </script>
    </body>
</html>
"#;

// GET / -> index html, the room is assigned server-side
fn index() -> impl warp::Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path::end().map(|| warp::reply::html(INDEX_HTML))
}

fn with_state(
    state: ServerState,
) -> impl warp::Filter<Extract = (ServerState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

async fn upgrade_connection(
    ws: warp::ws::Ws,
    state: ServerState,
) -> Result<impl warp::Reply, Infallible> {
    // This will call our function if the handshake succeeds.
    Ok(ws.on_upgrade(move |socket| user_connected(socket, state)))
}

// GET /chat -> websocket upgrade
fn ws_upgrade(
    state: ServerState,
) -> impl warp::Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("chat")
        // The `ws()` filter will prepare Websocket handshake...
        .and(warp::ws())
        .and(with_state(state))
        .and_then(upgrade_connection)
}

pub fn build_filters(
    state: ServerState,
) -> impl warp::Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    index().or(ws_upgrade(state))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::{index, ws_upgrade, INDEX_HTML},
        ServerState,
    };

    // give the spawned connection tasks a chance to run
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn index_endpoint() {
        let filter = index();
        let ok_reply = warp::test::request().path("/").reply(&filter).await;

        assert_eq!(ok_reply.status(), 200);
        assert_eq!(ok_reply.body(), INDEX_HTML);

        let unknown_path = warp::test::request()
            .path("/some_room")
            .reply(&filter)
            .await;
        assert_eq!(unknown_path.status(), 404);
    }

    #[tokio::test]
    async fn chat_upgrade_places_the_session() {
        let state = ServerState::new(2);
        let filter = ws_upgrade(state.clone());

        let _client = warp::test::ws()
            .path("/chat")
            .handshake(filter.clone())
            .await
            .expect("handshake");
        settle().await;

        let controller = state.controller.read().await;
        assert_eq!(controller.room_count(), 1);

        // Fail test
        let wrong_path = warp::test::ws().path("/pair").handshake(filter).await;
        assert!(wrong_path.is_err());
    }

    #[tokio::test]
    async fn pairs_sessions_into_a_shared_room() {
        let state = ServerState::new(2);
        let filter = ws_upgrade(state.clone());

        let mut first = warp::test::ws()
            .path("/chat")
            .handshake(filter.clone())
            .await
            .expect("handshake");
        let mut second = warp::test::ws()
            .path("/chat")
            .handshake(filter)
            .await
            .expect("handshake");
        settle().await;

        second.send_text("hello over there").await;
        let relayed = first.recv().await.expect("relayed message");
        assert!(relayed
            .to_str()
            .expect("text frame")
            .contains("hello over there"));

        let controller = state.controller.read().await;
        assert_eq!(controller.room_count(), 1, "both sessions share one room");
    }

    #[tokio::test]
    async fn disconnect_retires_the_room() {
        let state = ServerState::new(1);
        let filter = ws_upgrade(state.clone());

        let mut client = warp::test::ws()
            .path("/chat")
            .handshake(filter)
            .await
            .expect("handshake");
        settle().await;
        assert_eq!(state.controller.read().await.room_count(), 1);

        client.send(warp::ws::Message::close()).await;
        drop(client);
        settle().await;

        assert_eq!(state.controller.read().await.room_count(), 0);
    }
}
