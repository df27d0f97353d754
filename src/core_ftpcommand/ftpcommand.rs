/// Control verbs understood by the server. Anything else is answered by the fallback handler.
#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    PASV,
    PORT,
    LIST,
    PWD,
    CWD,
    QUIT,
    RETR,
    STOR,
    SIZE,
    REST,
}

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "PASV" => Some(FtpCommand::PASV),
            "PORT" => Some(FtpCommand::PORT),
            "LIST" => Some(FtpCommand::LIST),
            "PWD" => Some(FtpCommand::PWD),
            "CWD" => Some(FtpCommand::CWD),
            "QUIT" => Some(FtpCommand::QUIT),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "SIZE" => Some(FtpCommand::SIZE),
            "REST" => Some(FtpCommand::REST),
            _ => None,
        }
    }
}
