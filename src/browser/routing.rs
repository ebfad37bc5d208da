/// Input after key resolution, independent of the terminal backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    Up,
    Down,
    Activate,
    Back,
    Reload,
    Menu,
    Detail,
    Download,
    Open,
    Edit,
    Cancel,
    Quit,
}

/// Interaction mode without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    List,
    Menu,
    Detail,
}

/// Something that can be done with an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Download,
    Open,
    Edit,
}

impl Action {
    /// Menu order
    pub const ALL: [Action; 3] = [Action::Download, Action::Open, Action::Edit];

    pub fn label(self) -> &'static str {
        match self {
            Action::Download => "download",
            Action::Open => "open",
            Action::Edit => "edit",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Action::Download => "download file to the working directory",
            Action::Open => "open file with the default viewer",
            Action::Edit => "open file in an editor",
        }
    }
}

/// What the browser should do in response to an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveCursor(isize),
    Activate,
    Ascend,
    Reload,
    OpenMenu,
    OpenDetail,
    Run(Action),
    MenuMove(isize),
    MenuRun,
    Scroll(isize),
    Close,
    Quit,
    Ignore,
}

/// Mode-dependent dispatch table.
pub fn route(mode: ModeKind, input: Input) -> Command {
    match (mode, input) {
        (_, Input::Quit) => Command::Quit,

        (ModeKind::List, Input::Down) => Command::MoveCursor(1),
        (ModeKind::List, Input::Up) => Command::MoveCursor(-1),
        (ModeKind::List, Input::Activate) => Command::Activate,
        (ModeKind::List, Input::Back) => Command::Ascend,
        (ModeKind::List, Input::Reload) => Command::Reload,
        (ModeKind::List, Input::Menu) => Command::OpenMenu,
        (ModeKind::List, Input::Detail) => Command::OpenDetail,
        (ModeKind::List, Input::Download) => Command::Run(Action::Download),
        (ModeKind::List, Input::Open) => Command::Run(Action::Open),
        (ModeKind::List, Input::Edit) => Command::Run(Action::Edit),
        (ModeKind::List, Input::Cancel) => Command::Ignore,

        (ModeKind::Menu, Input::Down) => Command::MenuMove(1),
        (ModeKind::Menu, Input::Up) => Command::MenuMove(-1),
        (ModeKind::Menu, Input::Activate) => Command::MenuRun,
        (ModeKind::Menu, Input::Cancel) => Command::Close,
        (ModeKind::Menu, _) => Command::Ignore,

        (ModeKind::Detail, Input::Down) => Command::Scroll(1),
        (ModeKind::Detail, Input::Up) => Command::Scroll(-1),
        (ModeKind::Detail, Input::Cancel) => Command::Close,
        (ModeKind::Detail, _) => Command::Ignore,
    }
}
