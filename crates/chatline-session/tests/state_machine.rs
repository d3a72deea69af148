use chatline_protocol::{Codec, Envelope, ProtocolMessage, TextCodec};
use chatline_session::{
    ClientEvent, ClientSession, ClientState, Intent, Reaction, SessionError, Transition,
};

fn inbound(line: &str) -> ProtocolMessage {
    TextCodec.decode(line.as_bytes()).message
}

fn outbound(t: &Transition) -> String {
    let msg = match t {
        Transition::Send(m) | Transition::Request(m) | Transition::Farewell(m) => m.clone(),
        Transition::Local(ev) => panic!("no wire effect expected, got {ev:?}"),
    };
    String::from_utf8(TextCodec.encode(&Envelope::bare(msg))).unwrap()
}

#[test]
fn test_full_conversation_walks_every_state() {
    let mut session = ClientSession::default();

    let t = session
        .handle_intent(Intent::Auth {
            username: "bob".into(),
            secret: "pw".into(),
            display_name: "Bob".into(),
        })
        .unwrap();
    assert_eq!(outbound(&t), "AUTH bob AS Bob USING pw");
    assert_eq!(session.state(), ClientState::Auth);

    let r = session.handle_message(&inbound("REPLY OK IS Auth success."));
    assert!(matches!(r, Reaction::Replied(_)));
    assert_eq!(session.state(), ClientState::Open);

    let r = session.handle_message(&inbound("MSG FROM Server IS Bob joined default."));
    assert_eq!(
        r,
        Reaction::Show(ClientEvent::Chat {
            sender: "Server".into(),
            content: "Bob joined default.".into(),
        })
    );

    let t = session
        .handle_intent(Intent::Join {
            channel_id: "general".into(),
        })
        .unwrap();
    assert_eq!(outbound(&t), "JOIN general AS Bob");
    assert_eq!(session.state(), ClientState::Join);

    session.handle_message(&inbound("REPLY NOK IS Join denied."));
    assert_eq!(session.state(), ClientState::Open);

    let t = session
        .handle_intent(Intent::Chat {
            content: "hi everyone".into(),
        })
        .unwrap();
    assert_eq!(outbound(&t), "MSG FROM Bob IS hi everyone");

    let t = session.handle_intent(Intent::Bye).unwrap();
    assert_eq!(outbound(&t), "BYE FROM Bob");
    assert_eq!(session.state(), ClientState::End);
}

#[test]
fn test_peer_bye_from_carol_ends_without_further_send() {
    let mut session = ClientSession::default();
    session
        .handle_intent(Intent::Auth {
            username: "bob".into(),
            secret: "pw".into(),
            display_name: "Bob".into(),
        })
        .unwrap();
    session.handle_message(&inbound("REPLY OK IS welcome"));

    let r = session.handle_message(&inbound("BYE FROM Carol"));
    assert_eq!(
        r,
        Reaction::Ended(ClientEvent::PeerLeft {
            sender: "Carol".into()
        })
    );
    assert_eq!(session.begin_shutdown(), None);
    assert_eq!(
        session.handle_intent(Intent::Chat {
            content: "anyone?".into()
        }),
        Err(SessionError::AlreadyEnded)
    );
}

#[test]
fn test_garbage_line_faults_with_error_message() {
    let mut session = ClientSession::default();
    let r = session.handle_message(&inbound("HELLO THERE"));
    let Reaction::Fault { error, .. } = r else {
        panic!("expected fault, got {r:?}");
    };
    let line = String::from_utf8(TextCodec.encode(&Envelope::bare(error))).unwrap();
    assert!(line.starts_with("ERR FROM Anonymous IS "), "{line}");
}
