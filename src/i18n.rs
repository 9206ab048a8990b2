use std::fmt;

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UiLanguage {
    #[default]
    Ko,
    En,
}

impl fmt::Display for UiLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiLanguage::Ko => f.write_str("ko"),
            UiLanguage::En => f.write_str("en"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    SelectLanguage,
    LanguageKorean,
    LanguageEnglish,
    Choice,
    InvalidLanguage,
    SelectMode,
    ModeChars,
    ModeWords,
    InvalidMode,
    ScanRoot,
    ReportPath,
    FilesDetected,
    StopHint,
    FilesCompleted,
    GeneratingReport,
    ReportSaved,
    Caution,
    CausedError,
    FolderSummary,
    PressEnter,
}

impl Message {
    pub fn text(self, language: UiLanguage) -> &'static str {
        use Message::*;
        // Menus are shown before a language is chosen, so they are bilingual.
        match (self, language) {
            (SelectLanguage, _) => "언어를 선택하세요 / Select language:",
            (LanguageKorean, _) => "1. 한국어",
            (LanguageEnglish, _) => "2. English",
            (Choice, _) => "선택 / Choice (1 or 2): ",
            (SelectMode, _) => "분석 방식을 선택하세요 / Select analysis type:",
            (ModeChars, _) => "1. 글자 수 분석 (Character Count)",
            (ModeWords, _) => "2. 단어 수 분석 (Word Count)",

            (InvalidLanguage, UiLanguage::Ko) => "잘못된 선택입니다. 기본값(한국어)을 사용합니다.",
            (InvalidLanguage, UiLanguage::En) => "Invalid selection. Using default (Korean).",
            (InvalidMode, UiLanguage::Ko) => {
                "잘못된 선택입니다. 기본값(글자 수 분석)을 사용합니다."
            }
            (InvalidMode, UiLanguage::En) => "Invalid selection. Using default (Character Count).",
            (ScanRoot, UiLanguage::Ko) => "파일 경로",
            (ScanRoot, UiLanguage::En) => "file path",
            (ReportPath, UiLanguage::Ko) => "보고서 경로",
            (ReportPath, UiLanguage::En) => "report path",
            (FilesDetected, UiLanguage::Ko) => "감지된 파일 수",
            (FilesDetected, UiLanguage::En) => "files detected",
            (StopHint, UiLanguage::Ko) => "중단하려면 Ctrl+C를 누르세요.",
            (StopHint, UiLanguage::En) => "Press Ctrl+C to stop.",
            (FilesCompleted, UiLanguage::Ko) => "완료된 파일",
            (FilesCompleted, UiLanguage::En) => "files completed",
            (GeneratingReport, UiLanguage::Ko) => "보고서 생성 중...",
            (GeneratingReport, UiLanguage::En) => "Generating report...",
            (ReportSaved, UiLanguage::Ko) => "보고서 저장됨",
            (ReportSaved, UiLanguage::En) => "Report saved",
            (Caution, UiLanguage::Ko) => "주의",
            (Caution, UiLanguage::En) => "Caution",
            (CausedError, UiLanguage::Ko) => "오류 발생",
            (CausedError, UiLanguage::En) => "caused an error",
            (FolderSummary, UiLanguage::Ko) => "폴더 전체 고유 값 요약",
            (FolderSummary, UiLanguage::En) => "Folder-wide unique summary",
            (PressEnter, UiLanguage::Ko) => "계속하려면 Enter 키를 누르세요...",
            (PressEnter, UiLanguage::En) => "Press Enter to continue...",
        }
    }
}

pub fn t(message: Message, language: UiLanguage) -> &'static str {
    message.text(language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menus_are_bilingual_and_fallback_notices_are_localized() {
        assert_eq!(
            t(Message::Choice, UiLanguage::Ko),
            t(Message::Choice, UiLanguage::En)
        );
        assert_ne!(
            t(Message::InvalidMode, UiLanguage::Ko),
            t(Message::InvalidMode, UiLanguage::En)
        );
        assert_eq!(t(Message::ReportSaved, UiLanguage::En), "Report saved");
    }
}
