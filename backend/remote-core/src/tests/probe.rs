use crate::connection::probe::is_connected_state;

use netstat2::TcpState;

/// **VALUE**: Verifies which TCP states count as connected.
///
/// **WHY THIS MATTERS**: After the operator quits, the client socket sits in
/// `CloseWait`; treating that as connected makes the next send hang until timeout.
///
/// **BUG THIS CATCHES**: Would catch `CloseWait` or `Closing` being dropped from the
/// excluded set.
#[test]
fn given_tcp_states_when_classified_then_closing_states_are_disconnected() {
    // GIVEN / WHEN / THEN: Active states are connected
    assert!(is_connected_state(TcpState::Established));
    assert!(is_connected_state(TcpState::FinWait1));

    // THEN: Closed or closing states are not
    assert!(!is_connected_state(TcpState::Unknown));
    assert!(!is_connected_state(TcpState::Closed));
    assert!(!is_connected_state(TcpState::Closing));
    assert!(!is_connected_state(TcpState::CloseWait));
}
