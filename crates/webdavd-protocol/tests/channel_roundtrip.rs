//! Messages keep their shape when crossing a real socket pair.

use std::io::{Read, Seek, SeekFrom, Write};

use rstest::rstest;
use webdavd_protocol::{
    Credentials, FileRequest, LockToken, Message, Opcode, RapChannel, RapRequest,
    TransferredHandle,
};

#[rstest]
#[case(Opcode::Authenticate)]
#[case(Opcode::ReadFile)]
#[case(Opcode::Put)]
#[case(Opcode::Propfind)]
#[case(Opcode::Proppatch)]
#[case(Opcode::Lock)]
#[case(Opcode::Mkcol)]
#[case(Opcode::Move)]
#[case(Opcode::Copy)]
#[case(Opcode::Delete)]
#[case(Opcode::CompleteRequestLock)]
fn request_opcodes_keep_params_and_handle(#[case] opcode: Opcode) {
    let (mut sender, mut receiver) = RapChannel::pair().expect("socket pair");
    let params = vec![
        b"dav.example.com".to_vec(),
        Vec::new(),
        vec![0_u8, 255, 10, 13],
        opcode.name().as_bytes().to_vec(),
    ];
    let mut file = tempfile::tempfile().expect("temp file");
    file.write_all(opcode.name().as_bytes()).expect("write");
    file.seek(SeekFrom::Start(0)).expect("rewind");

    let message = Message::new(opcode, params.clone())
        .expect("message")
        .with_handle(TransferredHandle::from(file));
    let sent = sender.send(&message).expect("send");
    assert_eq!(sent, 4 * (2 + params.len()) + params.iter().map(Vec::len).sum::<usize>());

    let (received_opcode, handle, received_params) =
        receiver.receive().expect("receive").into_parts();
    assert_eq!(received_opcode, opcode);
    assert_eq!(received_params, params);

    let mut contents = String::new();
    handle
        .expect("handle survives the trip")
        .into_file()
        .read_to_string(&mut contents)
        .expect("read handle");
    assert_eq!(contents, opcode.name());
}

#[rstest]
fn typed_requests_survive_the_channel() {
    let (mut listener, mut rap) = RapChannel::pair().expect("socket pair");
    let token = LockToken::generate();
    let requests = vec![
        RapRequest::Authenticate(Credentials::new("alice", "wonderland")),
        RapRequest::File(
            FileRequest::new(Opcode::Move, "dav.example.com", "/home/alice/a")
                .expect("file request")
                .with_lock_token(token)
                .with_argument("/home/alice/b"),
        ),
        RapRequest::CompleteLock {
            token,
            path: "/home/alice/a".to_owned(),
        },
    ];

    for request in requests {
        let opcode = request.opcode();
        listener
            .send(&request.into_message().expect("message"))
            .expect("send");
        let decoded = RapRequest::try_from(rap.receive().expect("receive")).expect("decode");
        assert_eq!(decoded.opcode(), opcode);
        match decoded {
            RapRequest::Authenticate(credentials) => {
                assert_eq!(credentials.user(), "alice");
                assert_eq!(credentials.secret(), "wonderland");
            }
            RapRequest::File(file) => {
                assert_eq!(file.lock_token(), Some(&token));
                assert_eq!(file.argument(), Some("/home/alice/b"));
            }
            RapRequest::CompleteLock { token: received, path } => {
                assert_eq!(received, token);
                assert_eq!(path, "/home/alice/a");
            }
        }
    }
}
