use proptest::prelude::*;

use hookcmd::Cmd;

fn token() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_./ -]{0,12}"
}

proptest! {
    #[test]
    fn interpreter_is_prepended_to_the_tokens(
        interpreter in proptest::option::of("[a-z]{1,8}"),
        tokens in proptest::collection::vec(token(), 0..6),
    ) {
        let mut cmd = Cmd::new();
        if let Some(interpreter) = &interpreter {
            cmd = cmd.interpreter(interpreter.clone());
        }

        let command = cmd.command(tokens.clone());

        let expected: Vec<String> = interpreter.into_iter().chain(tokens).collect();
        prop_assert_eq!(command.command_line(), expected.as_slice());
    }

    #[test]
    fn materialized_commands_do_not_see_later_registrations(
        first in proptest::collection::vec(token(), 1..4),
        second in proptest::collection::vec(token(), 1..4),
    ) {
        let cmd = Cmd::new();
        let a = cmd.command(first.clone());
        let cmd = cmd.interpreter("sh");
        let b = cmd.command(second.clone());

        prop_assert_eq!(a.command_line(), first.as_slice());
        prop_assert_eq!(&b.command_line()[0], "sh");
        prop_assert_eq!(&b.command_line()[1..], second.as_slice());
    }
}
