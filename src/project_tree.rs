use std::{cmp::Ordering, collections::BTreeMap, fs, path::Path};

use crate::classify;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeKind {
    Dir,
    File,
}

struct Node {
    kind: NodeKind,
    children: BTreeMap<String, Node>,
}

impl Node {
    fn dir() -> Self {
        Self {
            kind: NodeKind::Dir,
            children: BTreeMap::new(),
        }
    }

    fn file() -> Self {
        Self {
            kind: NodeKind::File,
            children: BTreeMap::new(),
        }
    }
}

/// Renders the entries below `root`, `max_depth` levels deep.
///
/// Directories come before files, each group ordered by name. Entries matched by
/// the shared exclusion rules and every dotfile are left out. The root itself is
/// not rendered; callers add their own header line.
pub fn render_tree(root: &Path, max_depth: usize) -> String {
    let mut tree = Node::dir();
    collect(root, max_depth, &mut tree);

    let mut lines = Vec::new();
    render_children(&tree, "", &mut lines);
    lines.join("\n")
}

fn collect(current: &Path, remaining: usize, node: &mut Node) {
    if remaining == 0 {
        return;
    }
    let entries = match fs::read_dir(current) {
        Ok(read_dir) => read_dir,
        Err(_) => return,
    };

    for entry in entries {
        let entry = match entry {
            Ok(value) => value,
            Err(_) => continue,
        };
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(_) => continue,
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = file_type.is_dir();
        if name.starts_with('.') || classify::is_excluded(&name, is_dir) {
            continue;
        }

        if is_dir {
            let child = node.children.entry(name).or_insert_with(Node::dir);
            collect(&entry.path(), remaining - 1, child);
        } else if file_type.is_file() {
            node.children.insert(name, Node::file());
        }
    }
}

fn render_children(node: &Node, prefix: &str, lines: &mut Vec<String>) {
    let mut children: Vec<(&String, &Node)> = node.children.iter().collect();
    children.sort_by(|(a_name, a_node), (b_name, b_node)| {
        match (a_node.kind, b_node.kind) {
            (NodeKind::Dir, NodeKind::File) => Ordering::Less,
            (NodeKind::File, NodeKind::Dir) => Ordering::Greater,
            _ => a_name.cmp(b_name),
        }
    });

    for (index, (name, child)) in children.iter().enumerate() {
        let is_last = index + 1 == children.len();
        let branch = if is_last { "└── " } else { "├── " };

        let line = match child.kind {
            NodeKind::Dir => format!("{}{}[D] {}/", prefix, branch, name),
            NodeKind::File => format!("{}{}[F] {}", prefix, branch, name),
        };
        lines.push(line);

        if child.kind == NodeKind::Dir {
            let next_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
            render_children(child, &next_prefix, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn directories_first_with_nested_indentation() {
        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), "src/a.py");
        touch(temp.path(), "readme.md");

        let rendered = render_tree(temp.path(), 4);
        let expected = ["├── [D] src/", "│   └── [F] a.py", "└── [F] readme.md"].join("\n");
        assert_eq!(rendered, expected);
        assert_eq!(rendered.lines().filter(|l| !l.trim().is_empty()).count(), 3);
    }

    #[test]
    fn branch_lines_stay_contiguous() {
        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), "src/components/Layout.tsx");
        touch(temp.path(), "src/main.tsx");
        touch(temp.path(), "tests/app_test.py");
        touch(temp.path(), "README.md");
        fs::create_dir_all(temp.path().join("empty-dir")).unwrap();

        let expected = [
            "├── [D] empty-dir/",
            "├── [D] src/",
            "│   ├── [D] components/",
            "│   │   └── [F] Layout.tsx",
            "│   └── [F] main.tsx",
            "├── [D] tests/",
            "│   └── [F] app_test.py",
            "└── [F] README.md",
        ]
        .join("\n");
        assert_eq!(render_tree(temp.path(), 4), expected);
    }

    #[test]
    fn excluded_entries_and_dotfiles_never_appear() {
        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), "node_modules/react/index.js");
        touch(temp.path(), ".git/HEAD");
        touch(temp.path(), "lib/node_modules/x.js");
        touch(temp.path(), ".env.example");
        touch(temp.path(), "yarn.lock");
        touch(temp.path(), "index.js");

        let rendered = render_tree(temp.path(), 4);
        assert!(!rendered.contains("node_modules"));
        assert!(!rendered.contains(".git"));
        assert!(!rendered.contains(".env"));
        assert!(!rendered.contains("yarn.lock"));
        assert_eq!(rendered, "├── [D] lib/\n└── [F] index.js");
    }

    #[test]
    fn stops_descending_at_max_depth() {
        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), "a/b/c/deep.txt");

        assert_eq!(render_tree(temp.path(), 2), "└── [D] a/\n    └── [D] b/");
        assert_eq!(render_tree(temp.path(), 0), "");
        assert_eq!(render_tree(&temp.path().join("missing"), 4), "");
    }
}
