use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pairchat::{ChannelMap, ChatRoomController, SessionHandle, User};
use tokio::sync::mpsc;

fn connected_user(id: usize, channels: &Arc<ChannelMap>) -> User {
    let (tx, _rx) = mpsc::unbounded_channel();
    User::create(SessionHandle::new(id, tx, channels.clone()))
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let channels = Arc::new(ChannelMap::default());

    c.bench_function("place and release 64 users in pairs", |b| {
        b.iter(|| {
            let mut controller = ChatRoomController::new();
            let mut users: Vec<User> = (0..64)
                .map(|id| connected_user(id, &channels))
                .collect();

            let placements: Vec<_> = users
                .iter_mut()
                .map(|user| {
                    controller
                        .add_user_to_valid_chat_room(user, 2)
                        .expect("placement")
                })
                .collect();

            for (user, room_id) in users.iter_mut().zip(&placements) {
                controller.remove_user_from_room(room_id, user);
            }

            black_box(controller.room_count())
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
