//! Mad Dog behavior tags, one enum per hook category

use crate::game::hooks::{Hook, HookKind};

/// Declare a hook enum together with its script names
macro_rules! hook_enum {
    (
        $(#[$meta:meta])*
        $name:ident : $kind:ident {
            $($variant:ident => [$($script:literal),+ $(,)?]),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl Hook for $name {
            const KIND: HookKind = HookKind::$kind;

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($($script)|+ => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

hook_enum! {
    /// Runs after a rect hit for the whole zone
    ZoneHit: ZoneHit {
        BulletHole => ["DEFAULT", "BULLETHOLE"],
        Skull => ["SKULL"],
        GlobalHit => ["GLOBALHIT"],
    }
}

hook_enum! {
    RectHit: RectHit {
        NewScene => ["DEFAULT", "NEWSCENE"],
        HideFront => ["HIDEFRONT"],
        HideRear => ["HIDEREAR"],
        MenuSelect => ["MENUSELECT"],
        Skull => ["SKULL"],
        KillMan => ["KILLMAN"],
        KillWoman => ["KILLWOMAN"],
        ProspectorSign => ["PROSPSIGN"],
        MineSign => ["MINESIGN"],
        MineItem1 => ["MINEITEM1"],
        MineItem2 => ["MINEITEM2"],
        MineItem3 => ["MINEITEM3"],
        MineLantern => ["MINELANTERN"],
        ShotHideout => ["SHOTHIDEOUT"],
        ShotRight => ["SHOTRIGHT"],
        ShotLeft => ["SHOTLEFT"],
        ShotMenu => ["SHOTMENU"],
        ExitMenu => ["EXITMENU"],
        ContinueMenu => ["CONTMENU"],
        StartMenu => ["STARTMENU"],
        StartBottles => ["STARTBOT"],
        Save => ["RECTSAVE"],
        Load => ["RECTLOAD"],
        Easy => ["RECTEASY"],
        Average => ["RECTAVG"],
        Hard => ["RECTHARD"],
    }
}

hook_enum! {
    PreOp: PreOp {
        DrawRect => ["DEFAULT", "DRAWRCT"],
        Pause => ["PAUSE"],
        PreShootout => ["PRESHOOTOUT"],
        MdShootout => ["MDSHOOTOUT"],
        FadeIn => ["FADEIN"],
        PauseFadeIn => ["PAUSFI"],
        PreRead => ["PREREAD"],
        PausePreRead => ["PAUSPR"],
    }
}

impl PreOp {
    /// Pre-ops whose scene carries a pause length in its first data slot
    pub fn is_pause(self) -> bool {
        matches!(self, PreOp::Pause | PreOp::PauseFadeIn | PreOp::PausePreRead)
    }
}

hook_enum! {
    ShowMsg: ShowMsg {
        Nothing => ["DEFAULT"],
    }
}

hook_enum! {
    /// Runs every tick while the scene plays
    InsOp: InsOp {
        Nothing => ["DEFAULT"],
        Pause => ["PAUSE"],
        StartGame => ["STARTGAME"],
        SkipSaloon => ["SKIPSALOON"],
        SkipSaloon2 => ["SKIPSALOON2"],
        CheckSaloon => ["CHECKSALOON"],
        IntoStable => ["INTOSTABLE"],
        IntoOffice => ["INTOFFICE"],
        IntoBank => ["INTOBANK_SP"],
        CheckBartender => ["CHKBARTNDR"],
        DidHideout => ["DIDHIDEOUT"],
        DidSignpost => ["DIDSIGNPOST"],
        DoShootout => ["DOSHOOTOUT"],
        MdShootout => ["MDSHOOTOUT"],
        ShootPast => ["SHOOTPAST"],
        ShootPastPause => ["SPAUSE"],
        ShotInto24 => ["SHOTINTO24"],
        ShotInto116 => ["SHOTINTO116"],
    }
}

hook_enum! {
    WeaponDown: WeaponDown {
        Reload => ["DEFAULT"],
    }
}

hook_enum! {
    Score: Score {
        Add => ["DEFAULT"],
    }
}

hook_enum! {
    NextFrame: NextFrame {
        Nothing => ["DEFAULT"],
    }
}

hook_enum! {
    NextScene: NextScene {
        Default => ["DEFAULT"],
        PickBottle => ["PICKBOTTLE"],
        Died => ["DIED"],
        AutoSelect => ["AUTOSEL"],
        FinishSaloon => ["FINSALOON"],
        FinishOffice => ["FINOFFICE"],
        FinishStable => ["FINSTABLE"],
        FinishBank => ["FINBANK"],
        PickSaloon => ["PICSALOON"],
        KillMan => ["KILLMAN"],
        KillWoman => ["KILLWOMAN"],
        Bank => ["BANK"],
        Stable => ["STABLE"],
        SaveProspector => ["SAVPROSP"],
        PickToss => ["PICKTOSS"],
        HitToss => ["HITTOSS"],
        MissToss => ["MISSTOSS"],
        PickSign => ["PICKSIGN"],
        BackRockMen => ["BROCKMAN"],
        LeftRockMen => ["LROCKMAN"],
        HotelMen => ["HOTELMEN"],
        DrawGun => ["DRAWGUN"],
    }
}
