//! Default interaction replies for every core message key.

use cmdkit_core::{CommandManager, MessageContext, MessageKey};

use crate::sender::SlashSender;

/// Register the default reply for every key the core emits.
pub fn install_defaults<S>(manager: &CommandManager<S>)
where
    S: SlashSender + Send + 'static,
{
    reply(manager, MessageKey::UNKNOWN_COMMAND, |context| {
        format!("This command is no longer available: `/{}`.", context.command)
    });
    reply(manager, MessageKey::UNKNOWN_SUB_COMMAND, |context| {
        format!(
            "This command is no longer available: `/{} {}`.",
            context.command,
            context.typed_argument.as_deref().unwrap_or_default()
        )
    });
    reply(manager, MessageKey::NOT_ENOUGH_ARGUMENTS, |_| {
        "Some required options are missing.".to_string()
    });
    reply(manager, MessageKey::TOO_MANY_ARGUMENTS, |_| {
        "Too many values were given.".to_string()
    });
    reply(manager, MessageKey::INVALID_ARGUMENT, |context| {
        format!(
            "`{}` is not a valid value for `{}`.",
            context.typed_argument.as_deref().unwrap_or_default(),
            context.argument_name.as_deref().unwrap_or("option")
        )
    });
    reply(manager, MessageKey::NO_PERMISSION, |_| {
        "You do not have a role that can use this command.".to_string()
    });
    reply(manager, MessageKey::EXECUTION_FAILED, |_| {
        "Something went wrong while running this command.".to_string()
    });
}

fn reply<S, F>(manager: &CommandManager<S>, key: MessageKey, text: F)
where
    S: SlashSender + Send + 'static,
    F: Fn(&MessageContext) -> String + Send + Sync + 'static,
{
    manager.register_message(key, move |sender: &S, context: &MessageContext| {
        sender.reply(&text(context))
    });
}
