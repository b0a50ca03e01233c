use std::sync::Arc;

use radix_trie::{SubTrie, Trie, TrieCommon};

use super::{Command, CommandRef};

/// Upper limit on the number of completions to return.
const MAX_COMPLETIONS: usize = 500;

fn subtrie_names(subtrie: SubTrie<String, CommandRef>, prefix: &str) -> Vec<String> {
    subtrie
        .keys()
        .filter(|name| name.starts_with(prefix))
        .take(MAX_COMPLETIONS)
        .cloned()
        .collect()
}

/// Commands indexed by name.
#[derive(Default)]
pub struct CommandRegistry {
    names: Trie<String, CommandRef>,
}

impl CommandRegistry {
    /// Add a command under its name, replacing any previous command with the same name.
    pub fn insert(&mut self, cmd: Command) -> CommandRef {
        let cmd = Arc::new(cmd);
        self.insert_ref(cmd.clone());

        return cmd;
    }

    /// Add an already shared command under its name.
    pub fn insert_ref(&mut self, cmd: CommandRef) -> Option<CommandRef> {
        self.names.insert(cmd.name().to_string(), cmd)
    }

    /// Look up a command by name.
    pub fn get(&self, name: &str) -> Option<&CommandRef> {
        self.names.get(name)
    }

    /// List the names of registered commands that start with `prefix`, in sorted order.
    pub fn complete(&self, prefix: &str) -> Vec<String> {
        let mut names = self
            .names
            .get_raw_descendant(prefix)
            .map(|st| subtrie_names(st, prefix))
            .unwrap_or_default();

        names.sort();

        return names;
    }

    /// The number of registered commands.
    pub fn len(&self) -> usize {
        self.names.len()
    }
}
